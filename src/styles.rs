use crate::config::RenderOptions;
use crate::template::{BorderSideData, ColorData, StyleData};
use crate::xml::xml_escape_simd;
use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_FONT_SIZE: f64 = 11.0;
pub const OPAQUE_BLACK: &str = "FF000000";

/// Custom formats 164..=170 are always emitted; template patterns start here.
const FIRST_CUSTOM_NUM_FMT: u32 = 171;

/// cellXfs index of the stock date-time style
pub const DATETIME_XF: u32 = 1;

static RGB_FUNC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*([0-9]*\.?[0-9]+)\s*)?\)$")
        .expect("valid rgb() pattern")
});

#[derive(Debug, Clone, PartialEq)]
pub enum NumberFormat {
    General,
    Integer,
    Decimal2,
    Decimal4,
    Percentage,
    PercentageDecimal,
    Currency,
    CurrencyRounded,
    DateTime,
    Time,
    Custom(String),
}

impl NumberFormat {
    /// Fixed id, or `None` for a pattern the registry numbers per workbook.
    pub fn num_fmt_id(&self) -> Option<u32> {
        match self {
            NumberFormat::General => Some(0),
            NumberFormat::Integer => Some(165),
            NumberFormat::Decimal2 => Some(166),
            NumberFormat::Decimal4 => Some(167),
            NumberFormat::Percentage => Some(9),
            NumberFormat::PercentageDecimal => Some(10),
            NumberFormat::Currency => Some(168),
            NumberFormat::CurrencyRounded => Some(169),
            NumberFormat::DateTime => Some(164),
            NumberFormat::Time => Some(170),
            NumberFormat::Custom(_) => None,
        }
    }

    pub fn from_pattern(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return None;
        }
        Some(match pattern {
            "General" | "general" => NumberFormat::General,
            "0" => NumberFormat::Integer,
            "0.00" => NumberFormat::Decimal2,
            "0.0000" => NumberFormat::Decimal4,
            "0%" => NumberFormat::Percentage,
            "0.00%" => NumberFormat::PercentageDecimal,
            "$#,##0.00" => NumberFormat::Currency,
            "$#,##0" => NumberFormat::CurrencyRounded,
            "yyyy-mm-dd hh:mm:ss" => NumberFormat::DateTime,
            "hh:mm:ss" => NumberFormat::Time,
            other => NumberFormat::Custom(other.to_string()),
        })
    }
}

/// Rows are 1-based, columns 0-based.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellStyle {
    pub font: Option<FontStyle>,
    pub fill: Option<FillStyle>,
    pub border: Option<BorderStyle>,
    pub alignment: Option<AlignmentStyle>,
    pub number_format: Option<NumberFormat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub size: Option<f64>,
    pub color: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillStyle {
    pub pattern_type: PatternType,
    pub fg_color: Option<String>,
    pub bg_color: Option<String>,
}

impl FillStyle {
    pub fn solid(argb: String) -> Self {
        Self { pattern_type: PatternType::Solid, fg_color: Some(argb), bg_color: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternType {
    None,
    Solid,
    Gray125,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BorderStyle {
    pub left: Option<BorderSide>,
    pub right: Option<BorderSide>,
    pub top: Option<BorderSide>,
    pub bottom: Option<BorderSide>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BorderSide {
    pub style: BorderLineStyle,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BorderLineStyle {
    Thin,
    Hair,
    Dotted,
    Dashed,
    DashDot,
    DashDotDot,
    Double,
    Medium,
    MediumDashed,
    MediumDashDot,
    MediumDashDotDot,
    SlantDashDot,
    Thick,
}

impl BorderLineStyle {
    /// Editor line-style code; 0 means no line.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => BorderLineStyle::Thin,
            2 => BorderLineStyle::Hair,
            3 => BorderLineStyle::Dotted,
            4 => BorderLineStyle::Dashed,
            5 => BorderLineStyle::DashDot,
            6 => BorderLineStyle::DashDotDot,
            7 => BorderLineStyle::Double,
            8 => BorderLineStyle::Medium,
            9 => BorderLineStyle::MediumDashed,
            10 => BorderLineStyle::MediumDashDot,
            11 => BorderLineStyle::MediumDashDotDot,
            12 => BorderLineStyle::SlantDashDot,
            13 => BorderLineStyle::Thick,
            _ => return None,
        })
    }

    fn as_str(self) -> &'static str {
        match self {
            BorderLineStyle::Thin => "thin",
            BorderLineStyle::Hair => "hair",
            BorderLineStyle::Dotted => "dotted",
            BorderLineStyle::Dashed => "dashed",
            BorderLineStyle::DashDot => "dashDot",
            BorderLineStyle::DashDotDot => "dashDotDot",
            BorderLineStyle::Double => "double",
            BorderLineStyle::Medium => "medium",
            BorderLineStyle::MediumDashed => "mediumDashed",
            BorderLineStyle::MediumDashDot => "mediumDashDot",
            BorderLineStyle::MediumDashDotDot => "mediumDashDotDot",
            BorderLineStyle::SlantDashDot => "slantDashDot",
            BorderLineStyle::Thick => "thick",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignmentStyle {
    pub horizontal: Option<HorizontalAlignment>,
    pub vertical: Option<VerticalAlignment>,
    pub wrap_text: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
    Justify,
}

impl HorizontalAlignment {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(HorizontalAlignment::Left),
            2 => Some(HorizontalAlignment::Center),
            3 => Some(HorizontalAlignment::Right),
            4 => Some(HorizontalAlignment::Justify),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
}

impl VerticalAlignment {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(VerticalAlignment::Top),
            2 => Some(VerticalAlignment::Center),
            3 => Some(VerticalAlignment::Bottom),
            _ => None,
        }
    }
}

/// Editor wrap strategy that means "wrap text".
const WRAP_STRATEGY_WRAP: u8 = 3;

// ============================================================================
// Color resolution
// ============================================================================

/// Normalize a CSS-ish color to 8-digit ARGB hex.
///
/// Accepts `rgb()`/`rgba()`, `#RGB`, `#RRGGBB` and `AARRGGBB`, with or without `#`.
pub fn parse_color(input: &str) -> Option<String> {
    let s = input.trim();

    if let Some(caps) = RGB_FUNC.captures(s) {
        let channel = |i: usize| caps[i].parse::<u16>().ok().map(|v| v.min(255) as u8);
        let (r, g, b) = (channel(1)?, channel(2)?, channel(3)?);
        let a = match caps.get(4) {
            Some(m) => {
                let alpha: f64 = m.as_str().parse().ok()?;
                (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
            }
            None => 255,
        };
        return Some(format!("{:02X}{:02X}{:02X}{:02X}", a, r, g, b));
    }

    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let doubled: String = hex.chars().flat_map(|c| [c, c]).collect();
            Some(format!("FF{}", doubled.to_ascii_uppercase()))
        }
        6 => Some(format!("FF{}", hex.to_ascii_uppercase())),
        8 => Some(hex.to_ascii_uppercase()),
        _ => None,
    }
}

/// Like [`parse_color`], but never fails: missing or unrecognized input yields `fallback`.
pub fn argb_from_rgb(input: Option<&str>, fallback: &str) -> String {
    match input {
        Some(raw) => parse_color(raw).unwrap_or_else(|| {
            log::warn!("unrecognized color '{}', using {}", raw, fallback);
            fallback.to_string()
        }),
        None => fallback.to_string(),
    }
}

fn color_rgb(color: &Option<ColorData>) -> Option<&str> {
    color.as_ref().and_then(|c| c.rgb.as_deref())
}

// ============================================================================
// Editor style -> cell style
// ============================================================================

/// Translate an editor style record into a registrable cell style.
pub fn style_from_data(data: &StyleData, options: &RenderOptions) -> CellStyle {
    let fill = color_rgb(&data.bg).and_then(|rgb| {
        let parsed = parse_color(rgb);
        if parsed.is_none() {
            log::warn!("unrecognized background color '{}', leaving cell unfilled", rgb);
        }
        parsed.map(FillStyle::solid)
    });

    CellStyle {
        font: Some(FontStyle {
            bold: data.bl == Some(1),
            italic: data.it == Some(1),
            underline: data.ul.as_ref().is_some_and(|d| d.s == 1),
            strikethrough: data.st.as_ref().is_some_and(|d| d.s == 1),
            size: Some(data.fs.filter(|s| *s > 0.0).unwrap_or(DEFAULT_FONT_SIZE)),
            color: color_rgb(&data.cl).map(|rgb| argb_from_rgb(Some(rgb), OPAQUE_BLACK)),
            name: Some(font_name(data, options)),
        }),
        fill,
        border: border_from_data(data),
        alignment: alignment_from_data(data, None, None),
        number_format: data.n.as_ref().and_then(|n| NumberFormat::from_pattern(&n.pattern)),
    }
}

/// Header style: built-in defaults with each template field overriding its own default.
pub fn header_style(template: Option<&StyleData>, options: &RenderOptions) -> CellStyle {
    let Some(data) = template else {
        return CellStyle {
            font: Some(FontStyle {
                bold: true,
                italic: false,
                underline: false,
                strikethrough: false,
                size: Some(options.header_font_size),
                color: Some(options.header_font_color.clone()),
                name: Some(options.font_name.clone()),
            }),
            fill: Some(FillStyle::solid(options.header_fill.clone())),
            border: None,
            alignment: Some(AlignmentStyle {
                horizontal: Some(HorizontalAlignment::Left),
                vertical: Some(VerticalAlignment::Center),
                wrap_text: false,
            }),
            number_format: None,
        };
    };

    // An explicit background without a color clears the default fill.
    let fill = match &data.bg {
        None => Some(FillStyle::solid(options.header_fill.clone())),
        Some(bg) => match bg.rgb.as_deref() {
            None => None,
            Some(rgb) => Some(FillStyle::solid(parse_color(rgb).unwrap_or_else(|| {
                log::warn!("unrecognized header background '{}', using default fill", rgb);
                options.header_fill.clone()
            }))),
        },
    };

    CellStyle {
        font: Some(FontStyle {
            bold: data.bl.map_or(true, |b| b == 1),
            italic: data.it == Some(1),
            underline: data.ul.as_ref().is_some_and(|d| d.s == 1),
            strikethrough: data.st.as_ref().is_some_and(|d| d.s == 1),
            size: Some(data.fs.filter(|s| *s > 0.0).unwrap_or(options.header_font_size)),
            color: Some(argb_from_rgb(color_rgb(&data.cl), &options.header_font_color)),
            name: Some(font_name(data, options)),
        }),
        fill,
        border: border_from_data(data),
        alignment: alignment_from_data(data, Some(HorizontalAlignment::Left), Some(VerticalAlignment::Center)),
        number_format: data.n.as_ref().and_then(|n| NumberFormat::from_pattern(&n.pattern)),
    }
}

fn font_name(data: &StyleData, options: &RenderOptions) -> String {
    match data.ff.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => options.font_name.clone(),
    }
}

fn alignment_from_data(
    data: &StyleData,
    default_h: Option<HorizontalAlignment>,
    default_v: Option<VerticalAlignment>,
) -> Option<AlignmentStyle> {
    let alignment = AlignmentStyle {
        horizontal: data.ht.and_then(HorizontalAlignment::from_code).or(default_h),
        vertical: data.vt.and_then(VerticalAlignment::from_code).or(default_v),
        wrap_text: data.tb == Some(WRAP_STRATEGY_WRAP),
    };
    if alignment == AlignmentStyle::default() {
        None
    } else {
        Some(alignment)
    }
}

fn border_from_data(data: &StyleData) -> Option<BorderStyle> {
    let bd = data.bd.as_ref()?;
    let border = BorderStyle {
        left: bd.l.as_ref().and_then(border_side),
        right: bd.r.as_ref().and_then(border_side),
        top: bd.t.as_ref().and_then(border_side),
        bottom: bd.b.as_ref().and_then(border_side),
    };
    if border == BorderStyle::default() {
        None
    } else {
        Some(border)
    }
}

fn border_side(side: &BorderSideData) -> Option<BorderSide> {
    let style = BorderLineStyle::from_code(side.s)?;
    Some(BorderSide {
        style,
        color: color_rgb(&side.cl).map(|rgb| argb_from_rgb(Some(rgb), OPAQUE_BLACK)),
    })
}

// ============================================================================
// Registry
// ============================================================================

pub struct StyleRegistry {
    fonts: Vec<FontStyle>,
    fills: Vec<FillStyle>,
    borders: Vec<BorderStyle>,
    custom_num_fmts: Vec<(u32, String)>,
    cell_xfs: Vec<CellXfEntry>,
}

#[derive(Debug, Clone, PartialEq)]
struct CellXfEntry {
    num_fmt_id: u32,
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    alignment: Option<AlignmentStyle>,
}

impl StyleRegistry {
    pub fn new(default_font: &str) -> Self {
        let mut registry = Self {
            fonts: vec![
                FontStyle {
                    bold: false,
                    italic: false,
                    underline: false,
                    strikethrough: false,
                    size: Some(DEFAULT_FONT_SIZE),
                    color: None,
                    name: Some(default_font.to_string()),
                },
            ],
            fills: vec![
                FillStyle { pattern_type: PatternType::None, fg_color: None, bg_color: None },
                FillStyle { pattern_type: PatternType::Gray125, fg_color: None, bg_color: None },
            ],
            borders: vec![BorderStyle::default()],
            custom_num_fmts: Vec::new(),
            cell_xfs: vec![],
        };

        registry.build_default_xfs();
        registry
    }

    fn build_default_xfs(&mut self) {
        self.cell_xfs = vec![
            CellXfEntry { num_fmt_id: 0, font_id: 0, fill_id: 0, border_id: 0, alignment: None },
            CellXfEntry { num_fmt_id: 164, font_id: 0, fill_id: 0, border_id: 0, alignment: None },
        ];
    }

    pub fn xf_count(&self) -> usize {
        self.cell_xfs.len()
    }

    pub fn register_cell_style(&mut self, style: &CellStyle) -> u32 {
        let font_id = if let Some(ref font) = style.font {
            self.get_or_add_font(font)
        } else {
            0
        };

        let fill_id = if let Some(ref fill) = style.fill {
            self.get_or_add_fill(fill)
        } else {
            0
        };

        let border_id = if let Some(ref border) = style.border {
            self.get_or_add_border(border)
        } else {
            0
        };

        let num_fmt_id = if let Some(ref fmt) = style.number_format {
            self.get_or_add_num_fmt(fmt)
        } else {
            0
        };

        let entry = CellXfEntry {
            num_fmt_id,
            font_id,
            fill_id,
            border_id,
            alignment: style.alignment.clone(),
        };

        if let Some(idx) = self.cell_xfs.iter().position(|xf| *xf == entry) {
            return idx as u32;
        }

        self.cell_xfs.push(entry);
        (self.cell_xfs.len() - 1) as u32
    }

    fn get_or_add_num_fmt(&mut self, fmt: &NumberFormat) -> u32 {
        if let Some(id) = fmt.num_fmt_id() {
            return id;
        }
        let NumberFormat::Custom(code) = fmt else {
            return 0;
        };
        if let Some((id, _)) = self.custom_num_fmts.iter().find(|(_, c)| c == code) {
            return *id;
        }
        let id = FIRST_CUSTOM_NUM_FMT + self.custom_num_fmts.len() as u32;
        self.custom_num_fmts.push((id, code.clone()));
        id
    }

    fn get_or_add_font(&mut self, font: &FontStyle) -> u32 {
        for (idx, f) in self.fonts.iter().enumerate() {
            if f == font {
                return idx as u32;
            }
        }
        self.fonts.push(font.clone());
        (self.fonts.len() - 1) as u32
    }

    fn get_or_add_fill(&mut self, fill: &FillStyle) -> u32 {
        for (idx, f) in self.fills.iter().enumerate() {
            if f == fill {
                return idx as u32;
            }
        }
        self.fills.push(fill.clone());
        (self.fills.len() - 1) as u32
    }

    fn get_or_add_border(&mut self, border: &BorderStyle) -> u32 {
        for (idx, b) in self.borders.iter().enumerate() {
            if b == border {
                return idx as u32;
            }
        }
        self.borders.push(border.clone());
        (self.borders.len() - 1) as u32
    }
}

fn escape_attr(value: &str) -> String {
    let mut buf = Vec::with_capacity(value.len());
    xml_escape_simd(value.as_bytes(), &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn generate_styles_xml_enhanced(registry: &StyleRegistry) -> String {
    let mut xml = String::with_capacity(2000 + registry.fonts.len() * 200);

    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<styleSheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\n");

    xml.push_str(&format!("<numFmts count=\"{}\">\n", 7 + registry.custom_num_fmts.len()));
    xml.push_str("  <numFmt numFmtId=\"164\" formatCode=\"yyyy-mm-dd hh:mm:ss\"/>\n");
    xml.push_str("  <numFmt numFmtId=\"165\" formatCode=\"0\"/>\n");
    xml.push_str("  <numFmt numFmtId=\"166\" formatCode=\"0.00\"/>\n");
    xml.push_str("  <numFmt numFmtId=\"167\" formatCode=\"0.0000\"/>\n");
    xml.push_str("  <numFmt numFmtId=\"168\" formatCode=\"$#,##0.00\"/>\n");
    xml.push_str("  <numFmt numFmtId=\"169\" formatCode=\"$#,##0\"/>\n");
    xml.push_str("  <numFmt numFmtId=\"170\" formatCode=\"hh:mm:ss\"/>\n");
    for (id, code) in &registry.custom_num_fmts {
        xml.push_str(&format!("  <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>\n", id, escape_attr(code)));
    }
    xml.push_str("</numFmts>\n");

    xml.push_str(&format!("<fonts count=\"{}\">\n", registry.fonts.len()));
    for font in &registry.fonts {
        xml.push_str("  <font>");
        if font.bold { xml.push_str("<b/>"); }
        if font.italic { xml.push_str("<i/>"); }
        if font.strikethrough { xml.push_str("<strike/>"); }
        if font.underline { xml.push_str("<u/>"); }
        if let Some(size) = font.size {
            xml.push_str(&format!("<sz val=\"{}\"/>", size));
        }
        if let Some(ref color) = font.color {
            xml.push_str(&format!("<color rgb=\"{}\"/>", color));
        }
        if let Some(ref name) = font.name {
            xml.push_str(&format!("<name val=\"{}\"/>", escape_attr(name)));
        }
        xml.push_str("</font>\n");
    }
    xml.push_str("</fonts>\n");

    xml.push_str(&format!("<fills count=\"{}\">\n", registry.fills.len()));
    for fill in &registry.fills {
        xml.push_str("  <fill>");
        match fill.pattern_type {
            PatternType::None => xml.push_str("<patternFill patternType=\"none\"/>"),
            PatternType::Gray125 => xml.push_str("<patternFill patternType=\"gray125\"/>"),
            PatternType::Solid => {
                xml.push_str("<patternFill patternType=\"solid\">");
                if let Some(ref fg) = fill.fg_color {
                    xml.push_str(&format!("<fgColor rgb=\"{}\"/>", fg));
                }
                if let Some(ref bg) = fill.bg_color {
                    xml.push_str(&format!("<bgColor rgb=\"{}\"/>", bg));
                } else {
                    xml.push_str("<bgColor indexed=\"64\"/>");
                }
                xml.push_str("</patternFill>");
            }
        }
        xml.push_str("</fill>\n");
    }
    xml.push_str("</fills>\n");

    xml.push_str(&format!("<borders count=\"{}\">\n", registry.borders.len()));
    for border in &registry.borders {
        xml.push_str("  <border>");
        write_border_side(&mut xml, "left", &border.left);
        write_border_side(&mut xml, "right", &border.right);
        write_border_side(&mut xml, "top", &border.top);
        write_border_side(&mut xml, "bottom", &border.bottom);
        xml.push_str("<diagonal/>");
        xml.push_str("</border>\n");
    }
    xml.push_str("</borders>\n");

    xml.push_str("<cellStyleXfs count=\"1\">\n");
    xml.push_str("  <xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/>\n");
    xml.push_str("</cellStyleXfs>\n");

    xml.push_str(&format!("<cellXfs count=\"{}\">\n", registry.cell_xfs.len()));
    for xf in &registry.cell_xfs {
        xml.push_str(&format!("  <xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"",
            xf.num_fmt_id, xf.font_id, xf.fill_id, xf.border_id));

        if xf.font_id > 0 { xml.push_str(" applyFont=\"1\""); }
        if xf.fill_id > 0 { xml.push_str(" applyFill=\"1\""); }
        if xf.border_id > 0 { xml.push_str(" applyBorder=\"1\""); }
        if xf.num_fmt_id > 0 { xml.push_str(" applyNumberFormat=\"1\""); }

        if let Some(ref align) = xf.alignment {
            xml.push_str(" applyAlignment=\"1\">");
            xml.push_str("<alignment");
            if let Some(h) = align.horizontal {
                xml.push_str(&format!(" horizontal=\"{}\"", match h {
                    HorizontalAlignment::Left => "left",
                    HorizontalAlignment::Center => "center",
                    HorizontalAlignment::Right => "right",
                    HorizontalAlignment::Justify => "justify",
                }));
            }
            if let Some(v) = align.vertical {
                xml.push_str(&format!(" vertical=\"{}\"", match v {
                    VerticalAlignment::Top => "top",
                    VerticalAlignment::Center => "center",
                    VerticalAlignment::Bottom => "bottom",
                }));
            }
            if align.wrap_text {
                xml.push_str(" wrapText=\"1\"");
            }
            xml.push_str("/>");
            xml.push_str("</xf>\n");
        } else {
            xml.push_str("/>\n");
        }
    }
    xml.push_str("</cellXfs>\n");

    xml.push_str("<cellStyles count=\"1\">\n");
    xml.push_str("  <cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/>\n");
    xml.push_str("</cellStyles>\n");
    xml.push_str("<dxfs count=\"0\"/>\n");

    xml.push_str("</styleSheet>");
    xml
}

fn write_border_side(xml: &mut String, side: &str, border: &Option<BorderSide>) {
    if let Some(ref b) = border {
        xml.push_str(&format!("<{} style=\"{}\">", side, b.style.as_str()));
        if let Some(ref color) = b.color {
            xml.push_str(&format!("<color rgb=\"{}\"/>", color));
        }
        xml.push_str(&format!("</{}>", side));
    } else {
        xml.push_str(&format!("<{}/>", side));
    }
}
