use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use pdf_splitter::{
    analyze_document, split_document, write_manifest, ContentFetcher, DocumentSource,
    RecommendedStrategy, SplitJob, SplitOptions, Strategy,
};
use std::path::Path;

const PAGE_COUNT: usize = 10;
const CHAPTERS: [(&str, usize); 3] = [("Getting Started", 1), ("Configuration", 4), ("Reference", 8)];

fn page_content(page: usize) -> Vec<u8> {
    let heading = CHAPTERS
        .iter()
        .find(|(_, start)| *start == page)
        .map(|(title, _)| title.to_string())
        .unwrap_or_else(|| format!("Body text on page {}", page));
    let size = if heading.starts_with("Body") { 11 } else { 24 };

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Integer(size)]),
            Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
            Operation::new("Tj", vec![Object::string_literal(heading)]),
            Operation::new("ET", vec![]),
        ],
    };
    content.encode().unwrap()
}

/// Builds a small PDF whose outline points at the first page of each chapter.
fn build_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids: Vec<ObjectId> = Vec::new();
    for page in 1..=PAGE_COUNT {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_content(page)));
        page_ids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        }));
    }
    let kids: Vec<Object> = page_ids.iter().map(|&id| id.into()).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => PAGE_COUNT as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let outlines_id = doc.new_object_id();
    let item_ids: Vec<ObjectId> = CHAPTERS.iter().map(|_| doc.new_object_id()).collect();
    for (idx, (title, page)) in CHAPTERS.iter().enumerate() {
        let mut item = dictionary! {
            "Title" => Object::string_literal(*title),
            "Parent" => outlines_id,
            "Dest" => vec![page_ids[page - 1].into(), "Fit".into()],
        };
        if let Some(next) = item_ids.get(idx + 1) {
            item.set("Next", *next);
        }
        if idx > 0 {
            item.set("Prev", item_ids[idx - 1]);
        }
        doc.objects.insert(item_ids[idx], Object::Dictionary(item));
    }
    doc.objects.insert(
        outlines_id,
        Object::Dictionary(dictionary! {
            "Type" => "Outlines",
            "First" => item_ids[0],
            "Last" => item_ids[item_ids.len() - 1],
            "Count" => CHAPTERS.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "Outlines" => outlines_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Operator Handbook"),
        "Author" => Object::string_literal("Docs Team"),
        "Keywords" => Object::string_literal("internal"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn page_count_of(path: &Path) -> usize {
    Document::load(path).unwrap().get_pages().len()
}

#[tokio::test]
async fn test_analyze_and_split_by_bookmarks() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("handbook.pdf");
    std::fs::write(&source_path, build_pdf()).unwrap();

    let (document, info) = ContentFetcher::load_document(source_path.to_str().unwrap())
        .await
        .unwrap();
    assert_eq!(document.page_count(), PAGE_COUNT);
    assert_eq!(info.filename, "handbook.pdf");
    assert_eq!(document.metadata().title, "Operator Handbook");

    let analysis = analyze_document(&document);
    let titles: Vec<&str> = analysis.bookmarks().iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Getting Started", "Configuration", "Reference"]);
    assert_eq!(
        analysis.recommendation().primary_strategy,
        RecommendedStrategy::Bookmarks
    );

    let output_dir = dir.path().join("splits");
    let options = SplitOptions {
        strategy: Strategy::Auto,
        output_dir: output_dir.clone(),
        ..SplitOptions::default()
    };
    let mut job = SplitJob::new(&document, &analysis, &options);
    let result = split_document(&mut job).unwrap();

    assert!(result.is_success(), "{:?}", result.errors());
    assert_eq!(result.strategy_used(), "bookmark");
    let ranges: Vec<&str> = result
        .output_files()
        .iter()
        .map(|f| f.page_range.as_str())
        .collect();
    assert_eq!(ranges, vec!["1-3", "4-7", "8-10"]);

    let expected_pages = [3, 4, 3];
    for (file, expected) in result.output_files().iter().zip(expected_pages) {
        assert!(file.file_size > 0);
        assert_eq!(page_count_of(&file.filename), expected);
    }

    let first = Document::load(&result.output_files()[0].filename).unwrap();
    let info_id = first.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info_dict = first.get_dictionary(info_id).unwrap();
    assert!(info_dict.has(b"Title"));
    assert!(!info_dict.has(b"Keywords"));

    let manifest = write_manifest(&result, &output_dir).unwrap();
    assert_eq!(manifest, output_dir.join("handbook_manifest.json"));
}

#[tokio::test]
async fn test_forced_page_strategy_with_token_budget() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("handbook.pdf");
    std::fs::write(&source_path, build_pdf()).unwrap();

    let (document, _) = ContentFetcher::load_document(source_path.to_str().unwrap())
        .await
        .unwrap();
    let analysis = analyze_document(&document);
    let options = SplitOptions {
        strategy: Strategy::Pages,
        max_tokens: Some(1600),
        output_dir: dir.path().join("pages"),
        preserve_metadata: false,
        ..SplitOptions::default()
    };

    let mut job = SplitJob::new(&document, &analysis, &options);
    let result = split_document(&mut job).unwrap();

    assert!(result.is_success());
    assert_eq!(result.split_count(), 3);
    assert_eq!(result.metadata()["max_pages_per_split"], 4);
    let last = &result.output_files()[2];
    assert_eq!(last.page_range, "9-10");
    assert_eq!(page_count_of(&last.filename), 2);

    let exported = Document::load(&last.filename).unwrap();
    assert!(exported.trailer.get(b"Info").is_err());
}
