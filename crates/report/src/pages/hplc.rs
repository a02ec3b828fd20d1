//! SEC-HPLC result slides: chromatograms in a 2x2 grid with purity captions.

use super::style::{add_conclusion, add_eln, section_title, ACCENT};
use super::{is_missing_reference, PageContext};
use crate::extract::extractor_for;
use purification_core::extract::remove_scratch_image;
use purification_core::labels::purity_key;
use purification_core::{
    ExtractedImage, HplcStepInfo, Paginator, ProteinPurityByStep, PurityEntry, ReportModel,
    Result,
};
use purification_pptx::{cm, pt, Align, Deck, Layout, Point, Rect};

/// Chromatograms per slide.
pub const PICTURES_PER_PAGE: usize = 4;

const COLUMN_LEFTS: [f64; 2] = [5.2, 18.5];
const ROW_TOPS: [f64; 2] = [3.2, 8.8];
const CELL_WIDTH: f64 = 12.0;
const CAPTION_HEIGHT: f64 = 0.6;
/// Gap between a caption's top and its picture.
const PICTURE_OFFSET: f64 = 0.8;
const PICTURE_HEIGHT: f64 = 4.0;

/// Number and purity of `sample` at the step keyed `key`, or the
/// `("1", "100%")` default when either is unknown.
fn purity_for(purity: &ProteinPurityByStep, key: &str, sample: &str) -> PurityEntry {
    match purity.get(key).and_then(|proteins| proteins.get(sample)) {
        Some(entry) => entry.clone(),
        None => {
            log::debug!("No purity for '{}' at step '{}'", sample, key);
            PurityEntry::default()
        }
    }
}

/// Emit chromatography slides for every step that references a file.
///
/// Extracted pictures are deleted as soon as they are placed; whatever a
/// failed placement leaves behind is deleted before returning.
pub fn build_hplc(deck: &mut Deck, model: &ReportModel, context: &PageContext) -> Result<()> {
    for step in &model.hplc_steps {
        if is_missing_reference(&step.picture) {
            log::debug!("No chromatography file for step '{}'", step.step_name);
            continue;
        }

        let path = context.resolve(&step.picture);
        let images = extractor_for(&path)?.extract(&path, context.scratch_dir)?;
        if images.is_empty() {
            log::warn!(
                "No chromatograms found in '{}'; step '{}' gets no pictures",
                path.display(),
                step.step_name
            );
        }

        let placed = place_chromatograms(deck, &model.purity, step, &images);
        for image in &images {
            if image.path.exists() {
                remove_scratch_image(&image.path)?;
            }
        }
        placed?;
    }

    Ok(())
}

fn place_chromatograms(
    deck: &mut Deck,
    purity: &ProteinPurityByStep,
    step: &HplcStepInfo,
    images: &[ExtractedImage],
) -> Result<()> {
    let key = purity_key(&step.step_no, &step.step_name);
    let paginator = Paginator::new(PICTURES_PER_PAGE).with_minimum_one_page();

    for page in paginator.pages(images.len()) {
        let slide = deck.new_slide(Layout::Evidence);
        slide.set_title(section_title(&format!("SEC-HPLC Results – {}", step.step_name)));

        for (n, image) in images[page].iter().enumerate() {
            let left = COLUMN_LEFTS[n % 2];
            let top = ROW_TOPS[n / 2];
            let entry = purity_for(purity, &key, &image.name);

            let caption = slide.add_textbox(Rect::cm(left, top, CELL_WIDTH, CAPTION_HEIGHT));
            caption
                .text
                .set_text(format!("{}.{}, {}", entry.no, image.name, entry.purity));
            caption.text.format_paragraphs(pt(14.0), Some(Align::Center));

            let picture = slide.add_picture(
                &image.path,
                Point::cm(left, top + PICTURE_OFFSET),
                Some((cm(CELL_WIDTH), cm(PICTURE_HEIGHT))),
            )?;
            picture.outline = Some(ACCENT);
            remove_scratch_image(&image.path)?;
        }

        add_conclusion(slide, Rect::cm(2.3, 14.2, 31.5, 3.0), &step.conclusion);
        add_eln(slide, &step.eln);
        log::debug!("Chromatography slide for '{}'", step.step_name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use purification_core::{Error, Workbook};
    use purification_pptx::Shape;
    use std::io::{Cursor, Write};
    use std::path::Path;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn png_bytes(shade: u8) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            3,
            2,
            image::Rgb([shade, shade, shade]),
        ))
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
        out.into_inner()
    }

    /// A Word report with one table and two pictures per sample.
    fn write_docx(path: &Path, samples: &[&str]) {
        let mut body = String::new();
        let mut rels = String::new();
        let mut media = Vec::new();
        for (i, sample) in samples.iter().enumerate() {
            body.push_str(&format!(
                "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Sample name:</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
                sample
            ));
            for k in 0..2 {
                let id = format!("rId{}", i * 2 + k + 1);
                body.push_str(&format!(
                    r#"<w:p><w:r><w:drawing><wp:inline><a:graphic><a:graphicData><pic:pic><pic:blipFill><a:blip r:embed="{}"/></pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
                    id
                ));
                let name = format!("image{}.png", i * 2 + k + 1);
                rels.push_str(&format!(
                    r#"<Relationship Id="{}" Type="image" Target="media/{}"/>"#,
                    id, name
                ));
                media.push((name, png_bytes((i * 2 + k) as u8)));
            }
        }

        let file = std::fs::File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default();
        zip.start_file("word/document.xml", options).unwrap();
        write!(
            zip,
            r#"<w:document xmlns:w="w" xmlns:wp="wp" xmlns:a="a" xmlns:pic="pic" xmlns:r="r"><w:body>{}</w:body></w:document>"#,
            body
        )
        .unwrap();
        zip.start_file("word/_rels/document.xml.rels", options).unwrap();
        write!(zip, "<Relationships>{}</Relationships>", rels).unwrap();
        for (name, bytes) in media {
            zip.start_file(format!("word/media/{}", name), options).unwrap();
            zip.write_all(&bytes).unwrap();
        }
        zip.finish().unwrap();
    }

    fn model(file: &str) -> ReportModel {
        let mut model = ReportModel::from_workbook_with_date(&Workbook::default(), "01/02/2021");
        model.hplc_steps = vec![HplcStepInfo {
            step_no: "2".to_string(),
            step_name: "Protein A".to_string(),
            picture: file.to_string(),
            eln: "ELN-9".to_string(),
            conclusion: "Main peak > 95%.".to_string(),
        }];
        model
            .purity
            .entry("2_Protein_A".to_string())
            .or_default()
            .insert(
                "S1".to_string(),
                PurityEntry {
                    no: "3".to_string(),
                    purity: "98.10%".to_string(),
                },
            );
        model
    }

    fn captions(deck: &Deck) -> Vec<Vec<String>> {
        deck.slides()
            .iter()
            .map(|slide| {
                slide
                    .shapes
                    .iter()
                    .filter_map(|s| match s {
                        Shape::TextBox(t) if t.frame.cy == cm(CAPTION_HEIGHT) => {
                            Some(t.text.text())
                        }
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_grid_pages_and_captions() {
        let dir = tempfile::tempdir().unwrap();
        write_docx(&dir.path().join("sec.docx"), &["S1", "S2", "S3", "S4", "S5"]);
        let scratch = tempfile::tempdir().unwrap();
        let context = PageContext::new(dir.path(), scratch.path());

        let mut deck = Deck::new();
        build_hplc(&mut deck, &model("sec.docx"), &context).unwrap();

        assert_eq!(deck.len(), 2);
        let captions = captions(&deck);
        assert_eq!(captions[0][0], "3.S1, 98.10%");
        assert_eq!(captions[0][1], "1.S2, 100%");
        assert_eq!(captions[0].len(), 4);
        assert_eq!(captions[1], vec!["1.S5, 100%"]);

        let picture = deck.slides()[0]
            .shapes
            .iter()
            .find_map(|s| match s {
                Shape::Picture(p) => Some(p),
                _ => None,
            })
            .unwrap();
        assert_eq!(picture.outline, Some(ACCENT));
        assert_eq!(picture.frame, Rect::cm(5.2, 4.0, 12.0, 4.0));

        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_no_pictures_still_emits_conclusion_slide() {
        let dir = tempfile::tempdir().unwrap();
        write_docx(&dir.path().join("empty.docx"), &[]);
        let scratch = tempfile::tempdir().unwrap();
        let context = PageContext::new(dir.path(), scratch.path());

        let mut deck = Deck::new();
        build_hplc(&mut deck, &model("empty.docx"), &context).unwrap();

        assert_eq!(deck.len(), 1);
        let slide = &deck.slides()[0];
        assert_eq!(
            slide.body.as_ref().unwrap().text.text(),
            "Conclusion\nMain peak > 95%."
        );
        assert!(slide.texts().contains(&"ELN-9".to_string()));
    }

    #[test]
    fn test_sentinel_reference_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let context = PageContext::new(dir.path(), dir.path());
        let mut deck = Deck::new();
        build_hplc(&mut deck, &model("-"), &context).unwrap();
        assert!(deck.is_empty());
    }

    #[test]
    fn test_unsupported_container_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let context = PageContext::new(dir.path(), dir.path());
        let mut deck = Deck::new();
        let err = build_hplc(&mut deck, &model("trace.txt"), &context).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_purity_default() {
        let purity = ProteinPurityByStep::new();
        let entry = purity_for(&purity, "1_SEC", "X");
        assert_eq!(entry.no, "1");
        assert_eq!(entry.purity, "100%");
    }
}
