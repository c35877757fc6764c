use super::*;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tempfile::TempDir;

/// Write a minimal PDF with one text line per page
pub(crate) fn write_test_pdf(path: &Path, pages: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content encodes"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(pages.len() as i64),
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(595),
            Object::Integer(842),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("test pdf saves");
}

#[test]
fn pdf_extension_is_case_insensitive() {
    assert!(is_pdf(Path::new("manual.pdf")));
    assert!(is_pdf(Path::new("MANUAL.PDF")));
    assert!(is_pdf(Path::new("dir/informe.Pdf")));
    assert!(!is_pdf(Path::new("notas.txt")));
    assert!(!is_pdf(Path::new("pdf")));
    assert!(!is_pdf(Path::new("archive.pdf.zip")));
}

#[test]
fn find_pdf_files_filters_and_sorts() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let dir = temp_dir.path();
    fs::write(dir.join("b.pdf"), b"%PDF-1.5").expect("write");
    fs::write(dir.join("a.PDF"), b"%PDF-1.5").expect("write");
    fs::write(dir.join("notes.txt"), b"hello").expect("write");
    fs::create_dir(dir.join("nested.pdf")).expect("mkdir");

    let files = find_pdf_files(dir).expect("listing succeeds");
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().expect("file name").to_string_lossy().into_owned())
        .collect();

    assert_eq!(names, vec!["a.PDF", "b.pdf"]);
}

#[test]
fn find_pdf_files_on_missing_directory_fails() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    assert!(find_pdf_files(&temp_dir.path().join("missing")).is_err());
}

#[test]
fn load_pdf_extracts_pages_in_order() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("guia.pdf");
    write_test_pdf(&path, &["Hello World!", "Second page"]);

    let document = load_pdf(&path).expect("pdf loads");

    assert_eq!(document.path, path);
    assert_eq!(document.pages.len(), 2);
    assert_eq!(document.pages[0].number, 1);
    assert_eq!(document.pages[1].number, 2);
    assert!(document.pages[0].text.contains("Hello World!"));
    assert!(document.pages[1].text.contains("Second page"));
}

#[test]
fn load_pdf_rejects_garbage() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("broken.pdf");
    fs::write(&path, b"this is not a pdf").expect("write");

    let result = load_pdf(&path);
    assert!(matches!(result, Err(ChatbotError::Pdf(_))));
}
