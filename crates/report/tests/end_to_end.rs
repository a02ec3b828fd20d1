//! Workbook to saved report, read back through the outline reader.

use purification_pptx::PptxParser;
use purification_report::{ReportAssembler, ReportOptions};
use rust_xlsxwriter::Workbook as XlsxWorkbook;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::ZipWriter;

const PURIFICATION_HEADERS: [&str; 17] = [
    "ProjectName",
    "Date",
    "PurificationStepNo",
    "PurificationStep",
    "ProteinNo",
    "ProteinName",
    "Concentration (mg/ml)",
    "Volume (ml)",
    "Amount (mg)",
    "Yield (mg/L)",
    "Buffer",
    "Purity by SEC-HPLC (%)",
    "Recovery (%)",
    "MW (kDa)",
    "PI",
    "Supernatant (mL)",
    "Comments",
];

const EVIDENCE_HEADERS: [&str; 9] = [
    "PurificationStepNo",
    "PurificationStep",
    "SDS_Picture",
    "SDS_Table",
    "SDS_ELN",
    "SDS_Conclusion",
    "HPLC_Picture",
    "HPLC_ELN",
    "HPLC_Conclusion",
];

const LANE_HEADERS: [&str; 4] = ["Table", "Lane", "Protein name", "MW(kDa)"];

fn png_bytes() -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 3, image::Rgb([20, 90, 160])))
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Chromatography report: a sample-name table and two pictures per sample.
fn write_chromatography_docx(path: &Path, samples: &[&str]) {
    let mut body = String::new();
    let mut rels = String::new();
    let mut media = Vec::new();
    for (i, sample) in samples.iter().enumerate() {
        body.push_str(&format!(
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Sample name:</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
            sample
        ));
        for k in 0..2 {
            let n = i * 2 + k + 1;
            body.push_str(&format!(
                r#"<w:p><w:r><w:drawing><wp:inline><a:graphic><a:graphicData><pic:pic><pic:blipFill><a:blip r:embed="rId{}"/></pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
                n
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="image" Target="media/image{}.png"/>"#,
                n, n
            ));
            media.push(format!("word/media/image{}.png", n));
        }
    }

    let mut zip = ZipWriter::new(std::fs::File::create(path).unwrap());
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
    for name in media {
        zip.start_file(name, options).unwrap();
        zip.write_all(&png_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn write_headers(sheet: &mut rust_xlsxwriter::Worksheet, headers: &[&str]) {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
}

/// Two proteins: P1 through Protein A then SEC, P2 through Protein A only.
fn write_workbook(path: &Path) {
    let mut xlsx = XlsxWorkbook::new();

    let sheet = xlsx.add_worksheet();
    write_headers(sheet, &PURIFICATION_HEADERS);
    let rows: [(f64, &str, f64, &str, f64, &str); 3] = [
        (1.0, "Protein A", 1.0, "P1", 2.5, "95.1%"),
        (2.0, "SEC", 1.0, "P1", 1.25, "99.2%"),
        (1.0, "Protein A", 2.0, "P2", 0.8, "90.0%"),
    ];
    for (i, (step_no, step, protein_no, protein, concentration, purity)) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, "WBP42").unwrap();
        sheet.write_string(r, 1, "03/09/2021").unwrap();
        sheet.write_number(r, 2, *step_no).unwrap();
        sheet.write_string(r, 3, *step).unwrap();
        sheet.write_number(r, 4, *protein_no).unwrap();
        sheet.write_string(r, 5, *protein).unwrap();
        sheet.write_number(r, 6, *concentration).unwrap();
        sheet.write_string(r, 11, *purity).unwrap();
        sheet.write_number(r, 15, 500.0).unwrap();
    }

    let sheet = xlsx.add_worksheet();
    write_headers(sheet, &EVIDENCE_HEADERS);
    let evidence: [[&str; 9]; 2] = [
        ["1", "Protein A", "gel.png", "T1", "ELN-1", "Single band.", "-", "", ""],
        ["2", "SEC", "-", "", "", "", "sec.docx", "ELN-2", "Main peak.|No aggregates."],
    ];
    for (i, row) in evidence.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            sheet.write_string(i as u32 + 1, col as u16, *value).unwrap();
        }
    }

    let sheet = xlsx.add_worksheet();
    write_headers(sheet, &LANE_HEADERS);
    for (i, (lane, protein, mw)) in [("1", "P1", "150"), ("2", "P2", "75")].iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, "T1").unwrap();
        sheet.write_string(r, 1, *lane).unwrap();
        sheet.write_string(r, 2, *protein).unwrap();
        sheet.write_string(r, 3, *mw).unwrap();
    }

    xlsx.save(path).unwrap();
}

#[test]
fn test_generate_report() {
    let dir = tempfile::tempdir().unwrap();
    let workbook = dir.path().join("run.xlsx");
    write_workbook(&workbook);
    std::fs::write(dir.path().join("gel.png"), png_bytes()).unwrap();
    write_chromatography_docx(&dir.path().join("sec.docx"), &["P1", "P2"]);

    let output_dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let assembler = ReportAssembler::new(
        ReportOptions::new()
            .with_output_dir(output_dir.path())
            .with_scratch_dir(scratch.path()),
    );
    let report = assembler.generate(&workbook).unwrap();

    assert_eq!(
        report,
        output_dir.path().join("20210309 WBP42 Purification report.pptx")
    );
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);

    let outline = PptxParser::new().open(&report).unwrap();
    // cover, summary, process, steps, gel, chromatography
    assert_eq!(outline.slide_count(), 6);

    let cover = &outline.slides[0];
    assert!(cover.contains("WBP42 Purification Report"));
    assert!(cover.contains("BID_PE"));
    assert!(cover.contains("03/09/2021"));

    let summary = &outline.slides[1];
    assert!(summary.contains("Protein Purification Summary"));
    assert!(summary.contains("P1"));
    assert!(summary.contains("P2"));
    assert!(summary.texts().contains(&"2"));

    let process = &outline.slides[2];
    assert!(process.contains("Protein # 1"));
    assert!(process.contains("Protein # 2"));
    assert!(process.contains("Filtration & Storage"));

    let gel = &outline.slides[4];
    assert!(gel.contains("SDS-PAGE Results – Protein A"));
    assert!(gel.contains("500mL Protein Supernatant"));
    assert!(gel.contains("Single band."));

    let chromatography = &outline.slides[5];
    assert!(chromatography.contains("SEC-HPLC Results – SEC"));
    assert!(chromatography.contains("1.P1, 99.2%"));
    assert!(chromatography.contains("1.P2, 100%"));
    assert!(chromatography.contains("No aggregates."));
    assert!(chromatography.contains("ELN-2"));
    assert!(chromatography.texts().contains(&"6"));
}

#[test]
fn test_missing_workbook_fails() {
    let dir = tempfile::tempdir().unwrap();
    let assembler = ReportAssembler::default();
    assert!(assembler.generate(&dir.path().join("absent.xlsx")).is_err());
}
