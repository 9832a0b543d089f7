//! Output file naming.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::CompileError;

const ADJECTIVES: &[&str] = &[
    "Cosmic",
    "Stellar",
    "Galactic",
    "Nebulous",
    "Celestial",
    "Astral",
    "Lunar",
    "Solar",
    "Interstellar",
    "Meteoric",
    "Supernova",
    "Quantum",
    "Orbital",
    "Gravitational",
    "Wormhole",
    "Hyperdrive",
    "Plasma",
    "Neutron",
    "Antimatter",
    "Stardust",
];

const NOUNS: &[&str] = &[
    "Voyager",
    "Nebula",
    "Pulsar",
    "Quasar",
    "Supernova",
    "Comet",
    "Asteroid",
    "Constellation",
    "Galaxy",
    "Starship",
    "Cosmos",
    "Singularity",
    "Warp",
    "Nexus",
    "Cluster",
    "Nova",
    "Eclipse",
    "Horizon",
    "Zenith",
    "Vortex",
];

/// Random `Adjective_Noun_NNNN` name for compiled output.
pub fn generate_output_name() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("Cosmic");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("Voyager");
    let number: u16 = rng.gen_range(1000..=9999);
    format!("{adjective}_{noun}_{number}")
}

/// File name for a caller-chosen output name.
///
/// The name must be a bare file stem or file name: separators and parent
/// references are rejected so output always lands in the output directory.
pub fn output_file_name(name: &str) -> Result<String, CompileError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CompileError::invalid_options("Output name cannot be empty"));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(CompileError::invalid_options(format!(
            "Output name must not contain path separators: {name}"
        )));
    }

    if name.to_lowercase().ends_with(".pdf") {
        Ok(name.to_string())
    } else {
        Ok(format!("{name}.pdf"))
    }
}
