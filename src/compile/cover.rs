//! Generated cover pages.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Title printed on generated cover pages.
pub const DEFAULT_COVER_TITLE: &str = "Compiled PDF";

/// US Letter in points.
const PAGE_SIZE: (f32, f32) = (612.0, 792.0);

const TITLE_FONT_SIZE: f32 = 24.0;

/// Average Helvetica-Bold advance width as a fraction of the font size.
const AVERAGE_GLYPH_WIDTH: f32 = 0.6;

/// Build a one-page document with `title` centred in Helvetica-Bold.
///
/// Every inheritable page attribute is set on the page itself so the page
/// renders the same after it is grafted into another page tree.
pub fn title_page(title: &str) -> lopdf::Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let (width, height) = PAGE_SIZE;
    let text_width = title.chars().count() as f32 * TITLE_FONT_SIZE * AVERAGE_GLYPH_WIDTH;
    let x = ((width - text_width) / 2.0).max(0.0);
    let y = height / 2.0;

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), TITLE_FONT_SIZE.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(title)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}
