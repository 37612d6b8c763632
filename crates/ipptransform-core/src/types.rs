// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types shared by PREP, XFORM, and SINK: the resolved print
// option set, input document descriptors, and the small enums the pipeline
// switches on instead of comparing raw IPP/CLI strings at every call site.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hundredths of a millimeter — the unit IPP margins and media dimensions
/// are expressed in.
pub type HundredthsMm = i32;

/// `print-scaling` (RFC 8776 / PWG 5100.13).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrintScaling {
    None,
    Fit,
    Fill,
    Auto,
    AutoFit,
}

/// `sides`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sides {
    OneSided,
    TwoSidedLongEdge,
    TwoSidedShortEdge,
}

impl Sides {
    pub fn is_duplex(self) -> bool {
        !matches!(self, Sides::OneSided)
    }
}

/// Vendor `sheet-back` transform applied to the back side of a duplex sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SheetBack {
    Normal,
    Flipped,
    ManualTumble,
    Rotated,
}

/// `orientation-requested` (RFC 8011 5.2.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrientationRequested {
    Portrait,
    Landscape,
    ReverseLandscape,
    ReversePortrait,
}

impl OrientationRequested {
    pub fn ipp_enum_value(self) -> i32 {
        match self {
            Self::Portrait => 3,
            Self::Landscape => 4,
            Self::ReversePortrait => 5,
            Self::ReverseLandscape => 6,
        }
    }
}

/// `multiple-document-handling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultipleDocumentHandling {
    SingleDocument,
    SingleDocumentNewSheet,
    SeparateDocumentsCollatedCopies,
    SeparateDocumentsUncollatedCopies,
}

/// `page-delivery`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageDelivery {
    SameOrder,
    ReverseOrder,
}

/// `output-bin` orientation, as far as this pipeline cares: only whether the
/// printer stacks sheets face up (requiring reversed delivery order) or face
/// down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputBinOrientation {
    FaceUp,
    FaceDown,
}

/// `print-quality`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrintQuality {
    Draft,
    Normal,
    High,
}

impl PrintQuality {
    pub fn ipp_enum_value(self) -> i32 {
        match self {
            Self::Draft => 3,
            Self::Normal => 4,
            Self::High => 5,
        }
    }
}

/// `print-color-mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrintColorMode {
    Color,
    Monochrome,
    BiLevel,
    Auto,
}

/// `{x,y}-image-position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImagePosition {
    None,
    Center,
    BottomLeft,
    TopRight,
}

/// `job-sheets`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobSheets {
    None,
    Standard,
}

/// `job-error-sheet.report`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSheetReport {
    Never,
    Always,
    OnError,
}

/// Imposition template (`imposition-template`, booklet-maker subset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Imposition {
    None,
    Booklet,
}

/// A two-dimensional point/extent in hundredths of a millimeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub left: HundredthsMm,
    pub right: HundredthsMm,
    pub top: HundredthsMm,
    pub bottom: HundredthsMm,
}

/// Media size plus margins, in hundredths of a millimeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSize {
    pub width: HundredthsMm,
    pub height: HundredthsMm,
    pub margins: Margins,
}

impl MediaSize {
    /// Width/height of the printable (crop) box in points (1/72").
    pub fn crop_box_points(&self) -> (f64, f64, f64, f64) {
        let to_pt = |v: HundredthsMm| v as f64 / 2540.0 * 72.0;
        (
            to_pt(self.margins.left),
            to_pt(self.margins.bottom),
            to_pt(self.width - self.margins.right),
            to_pt(self.height - self.margins.top),
        )
    }

    /// Whole-page size in points.
    pub fn page_points(&self) -> (f64, f64) {
        let to_pt = |v: HundredthsMm| v as f64 / 2540.0 * 72.0;
        (to_pt(self.width), to_pt(self.height))
    }
}

/// A printer or vendor resolution pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub x_dpi: u32,
    pub y_dpi: u32,
}

/// Per-side image shift, in points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageShift {
    pub x_pt: f64,
    pub y_pt: f64,
}

/// Selection of which pages of an input document are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub first: u32,
    pub last: u32,
}

/// Output format the XFORM pipeline is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Pdf,
    Pclm,
    PostScript,
    Pcl,
    PwgRaster,
    AppleRaster,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Pclm => "application/PCLm",
            Self::PostScript => "application/postscript",
            Self::Pcl => "application/vnd.hp-PCL",
            Self::PwgRaster => "image/pwg-raster",
            Self::AppleRaster => "image/urf",
        }
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime {
            "application/pdf" => Some(Self::Pdf),
            "application/PCLm" => Some(Self::Pclm),
            "application/postscript" => Some(Self::PostScript),
            "application/vnd.hp-PCL" => Some(Self::Pcl),
            "image/pwg-raster" => Some(Self::PwgRaster),
            "image/urf" => Some(Self::AppleRaster),
            _ => None,
        }
    }
}

/// MIME type of a document the pipeline accepts as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputFormat {
    Pdf,
    Jpeg,
    Png,
    PwgRaster,
    PlainText,
}

impl InputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::PwgRaster => "image/pwg-raster",
            Self::PlainText => "text/plain",
        }
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime {
            "application/pdf" => Some(Self::Pdf),
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/pwg-raster" => Some(Self::PwgRaster),
            "text/plain" => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// Fully resolved print options for one job. Immutable after construction —
/// PREP, XFORM, and SINK all take `&PrintOptions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintOptions {
    pub media: MediaSize,
    pub print_scaling: PrintScaling,
    pub sides: Sides,
    pub sheet_back: SheetBack,
    pub orientation_requested: OrientationRequested,
    pub number_up: u32,
    pub imposition: Imposition,
    pub multiple_document_handling: MultipleDocumentHandling,
    pub page_delivery: PageDelivery,
    pub output_bin: OutputBinOrientation,
    pub copies: u32,
    pub page_ranges: Vec<PageRange>,
    pub force_front_side: Vec<u32>,
    pub image_shift_side1: ImageShift,
    pub image_shift_side2: ImageShift,
    pub x_image_position: ImagePosition,
    pub y_image_position: ImagePosition,
    pub quality: PrintQuality,
    pub print_color_mode: PrintColorMode,
    pub resolution: Resolution,
    pub job_sheets: JobSheets,
    pub job_error_sheet: ErrorSheetReport,
    pub separator_sheets: bool,
    pub output_format: OutputFormat,
}

impl PrintOptions {
    /// A reasonable default for a letter-size, one-sided, single-up job —
    /// the baseline CLI invocations and tests build on top of.
    pub fn defaults_for(output_format: OutputFormat) -> Self {
        Self {
            media: MediaSize {
                width: 21590,
                height: 27940,
                margins: Margins::default(),
            },
            print_scaling: PrintScaling::Auto,
            sides: Sides::OneSided,
            sheet_back: SheetBack::Normal,
            orientation_requested: OrientationRequested::Portrait,
            number_up: 1,
            imposition: Imposition::None,
            multiple_document_handling: MultipleDocumentHandling::SingleDocument,
            page_delivery: PageDelivery::SameOrder,
            output_bin: OutputBinOrientation::FaceDown,
            copies: 1,
            page_ranges: Vec::new(),
            force_front_side: Vec::new(),
            image_shift_side1: ImageShift::default(),
            image_shift_side2: ImageShift::default(),
            x_image_position: ImagePosition::Center,
            y_image_position: ImagePosition::Center,
            quality: PrintQuality::Normal,
            print_color_mode: PrintColorMode::Auto,
            resolution: Resolution {
                x_dpi: 300,
                y_dpi: 300,
            },
            job_sheets: JobSheets::None,
            job_error_sheet: ErrorSheetReport::Never,
            separator_sheets: false,
            output_format,
        }
    }

    /// `(cols, rows)` grid for the configured `number_up`, per the small
    /// table §3 fixes for the values IPP allows.
    pub fn number_up_grid(&self) -> (u32, u32) {
        match self.number_up {
            1 => (1, 1),
            2 => (1, 2),
            4 => (2, 2),
            6 => (2, 3),
            9 => (3, 3),
            12 => (3, 4),
            16 => (4, 4),
            _ => (1, 1),
        }
    }

    /// Serializes this job's resolved options to JSON, for handing a job
    /// description across a process boundary (e.g. a print-server parent
    /// re-invoking this pipeline as a filter) without re-resolving every
    /// IPP attribute on the other side.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// One document submitted as part of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDocument {
    pub path: PathBuf,
    pub declared_mime_type: String,
    /// Populated by PREP once the document has been converted to (or
    /// identified as) an intermediate PDF. `None` before preparation runs.
    pub intermediate_pdf_path: Option<PathBuf>,
    pub first_page: Option<u32>,
    pub last_page: Option<u32>,
    pub pages_selected_count: Option<u32>,
}

impl InputDocument {
    pub fn new(path: PathBuf, declared_mime_type: impl Into<String>) -> Self {
        Self {
            path,
            declared_mime_type: declared_mime_type.into(),
            intermediate_pdf_path: None,
            first_page: None,
            last_page: None,
            pages_selected_count: None,
        }
    }

    pub fn input_format(&self) -> Option<InputFormat> {
        InputFormat::from_mime_type(&self.declared_mime_type)
    }
}

/// Up to 16 placement rectangles (points, PDF coordinate space) for one
/// output page, computed from the media crop box, number-up, imposition,
/// and orientation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutGrid {
    pub cells: Vec<LayoutCell>,
}

/// One rectangle in a [`LayoutGrid`], `(x1, y1)`-`(x2, y2)` in points with
/// the origin at the page's bottom-left, plus the input-page cell index it
/// fills in row/column order (before orientation remapping).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutCell {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl LayoutCell {
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

/// One output impression produced by PREP: the composed page plus the
/// record of which input pages feed each grid cell.
#[derive(Debug, Clone)]
pub struct PreparedPage {
    /// Index of the input page occupying each cell, in layout order;
    /// `None` marks a blank cell (imposition padding).
    pub cell_inputs: Vec<Option<InputPageRef>>,
}

/// A reference to one page of one input document, used while composing a
/// [`PreparedPage`].
#[derive(Debug, Clone, Copy)]
pub struct InputPageRef {
    pub document_index: usize,
    pub page_number: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_up_grid_matches_spec_table() {
        let mut opts = PrintOptions::defaults_for(OutputFormat::Pdf);
        for (n, expected) in [(1, (1, 1)), (2, (1, 2)), (4, (2, 2)), (9, (3, 3)), (16, (4, 4))] {
            opts.number_up = n;
            assert_eq!(opts.number_up_grid(), expected);
        }
    }

    #[test]
    fn output_format_mime_round_trips() {
        for fmt in [
            OutputFormat::Pdf,
            OutputFormat::Pclm,
            OutputFormat::PostScript,
            OutputFormat::Pcl,
            OutputFormat::PwgRaster,
            OutputFormat::AppleRaster,
        ] {
            assert_eq!(OutputFormat::from_mime_type(fmt.mime_type()), Some(fmt));
        }
    }

    #[test]
    fn print_options_round_trip_through_json() {
        let mut opts = PrintOptions::defaults_for(OutputFormat::PwgRaster);
        opts.copies = 3;
        opts.number_up = 4;

        let json = opts.to_json().unwrap();
        let restored = PrintOptions::from_json(&json).unwrap();

        assert_eq!(restored.copies, 3);
        assert_eq!(restored.number_up, 4);
        assert_eq!(restored.output_format, OutputFormat::PwgRaster);
    }

    #[test]
    fn crop_box_subtracts_margins() {
        let media = MediaSize {
            width: 21590,
            height: 27940,
            margins: Margins {
                left: 635,
                right: 635,
                top: 635,
                bottom: 635,
            },
        };
        let (x1, y1, x2, y2) = media.crop_box_points();
        assert!(x1 > 0.0 && y1 > 0.0);
        assert!(x2 < media.page_points().0);
        assert!(y2 < media.page_points().1);
    }
}
