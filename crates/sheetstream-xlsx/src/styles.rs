//! styles.xml rendering from a registry snapshot

use sheetstream_core::style::{
    BorderEdge, BorderStyle, Color, FillStyle, FontStyle, HorizontalAlignment, NumberFormat,
    PatternType, StyleDescriptor, StyleSheet, VerticalAlignment,
};

use crate::xml::escape_text;

/// Render the complete `xl/styles.xml` part
///
/// Cell formats referencing a font, fill, border or custom number format the
/// pools do not hold (possible when raw descriptors were registered) fall
/// back to index 0.
pub(crate) fn render_styles_xml(sheet: &StyleSheet) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );

    if !sheet.number_formats.is_empty() {
        xml.push_str(&format!(
            "\n  <numFmts count=\"{}\">",
            sheet.number_formats.len()
        ));
        for (id, code) in &sheet.number_formats {
            xml.push_str(&format!(
                "\n    <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                id,
                escape_text(code)
            ));
        }
        xml.push_str("\n  </numFmts>");
    }

    xml.push_str(&format!("\n  <fonts count=\"{}\">", sheet.fonts.len()));
    for font in &sheet.fonts {
        xml.push_str("\n    ");
        xml.push_str(&write_font(font));
    }
    xml.push_str("\n  </fonts>");

    xml.push_str(&format!("\n  <fills count=\"{}\">", sheet.fills.len()));
    for fill in &sheet.fills {
        xml.push_str("\n    ");
        xml.push_str(&write_fill(fill));
    }
    xml.push_str("\n  </fills>");

    xml.push_str(&format!("\n  <borders count=\"{}\">", sheet.borders.len()));
    for border in &sheet.borders {
        xml.push_str("\n    ");
        xml.push_str(&write_border(border));
    }
    xml.push_str("\n  </borders>");

    xml.push_str(
        r#"
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>"#,
    );

    xml.push_str(&format!(
        "\n  <cellXfs count=\"{}\">",
        sheet.cell_formats.len()
    ));
    for desc in &sheet.cell_formats {
        xml.push_str("\n    ");
        xml.push_str(&write_xf(desc, sheet));
    }
    xml.push_str("\n  </cellXfs>");

    xml.push_str(
        r#"
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>
  <dxfs count="0"/>
  <tableStyles count="0" defaultTableStyle="TableStyleMedium9" defaultPivotStyle="PivotStyleLight16"/>
</styleSheet>"#,
    );
    xml
}

fn color_attrs(color: &Color) -> String {
    match color {
        Color::Auto => " auto=\"1\"".to_string(),
        Color::Theme(index) => format!(" theme=\"{}\"", index),
        other => match other.to_argb_hex() {
            Some(hex) => format!(" rgb=\"{}\"", hex),
            None => " auto=\"1\"".to_string(),
        },
    }
}

fn write_font(font: &FontStyle) -> String {
    let mut s = String::from("<font>");
    if font.bold {
        s.push_str("<b/>");
    }
    if font.italic {
        s.push_str("<i/>");
    }
    if font.strikethrough {
        s.push_str("<strike/>");
    }
    if let Some(val) = font.underline.xlsx_value() {
        s.push_str(&format!("<u val=\"{}\"/>", val));
    }
    s.push_str(&format!("<sz val=\"{}\"/>", font.size));
    if font.color != Color::Auto {
        s.push_str(&format!("<color{}/>", color_attrs(&font.color)));
    }
    s.push_str(&format!("<name val=\"{}\"/>", escape_text(&font.name)));
    s.push_str("</font>");
    s
}

fn write_fill(fill: &FillStyle) -> String {
    let mut children = String::new();
    if fill.foreground != Color::Auto {
        children.push_str(&format!("<fgColor{}/>", color_attrs(&fill.foreground)));
    }
    match (fill.pattern, fill.background) {
        (PatternType::Solid, Color::Auto) => children.push_str("<bgColor indexed=\"64\"/>"),
        (_, Color::Auto) => {}
        (_, background) => {
            children.push_str(&format!("<bgColor{}/>", color_attrs(&background)));
        }
    }

    let name = fill.pattern.xlsx_name();
    if children.is_empty() {
        format!("<fill><patternFill patternType=\"{}\"/></fill>", name)
    } else {
        format!(
            "<fill><patternFill patternType=\"{}\">{}</patternFill></fill>",
            name, children
        )
    }
}

fn write_border_edge(tag: &str, edge: Option<BorderEdge>) -> String {
    match edge {
        Some(e) if e.style != Default::default() => format!(
            "<{tag} style=\"{}\"><color{}/></{tag}>",
            e.style.xlsx_name(),
            color_attrs(&e.color)
        ),
        _ => format!("<{tag}/>"),
    }
}

fn write_border(border: &BorderStyle) -> String {
    let mut s = String::from("<border>");
    for (side, edge) in border.edges() {
        s.push_str(&write_border_edge(side.xlsx_name(), edge));
    }
    s.push_str("<diagonal/></border>");
    s
}

fn write_xf(desc: &StyleDescriptor, sheet: &StyleSheet) -> String {
    let pick = |index: u32, len: usize, what: &str| {
        if (index as usize) < len {
            index
        } else {
            log::warn!("style references missing {} {}, using 0", what, index);
            0
        }
    };
    let font_id = pick(desc.font, sheet.fonts.len(), "font");
    let fill_id = pick(desc.fill, sheet.fills.len(), "fill");
    let border_id = pick(desc.border, sheet.borders.len(), "border");
    let num_fmt_id = if desc.number_format < NumberFormat::FIRST_CUSTOM_ID {
        desc.number_format
    } else {
        let known = NumberFormat::FIRST_CUSTOM_ID as usize + sheet.number_formats.len();
        pick(desc.number_format, known, "number format")
    };

    let mut attrs = String::new();
    if num_fmt_id != 0 {
        attrs.push_str(" applyNumberFormat=\"1\"");
    }
    if font_id != 0 {
        attrs.push_str(" applyFont=\"1\"");
    }
    if fill_id != 0 {
        attrs.push_str(" applyFill=\"1\"");
    }
    if border_id != 0 {
        attrs.push_str(" applyBorder=\"1\"");
    }

    let aligned = desc.horizontal != HorizontalAlignment::General
        || desc.vertical != VerticalAlignment::Bottom;
    if aligned {
        attrs.push_str(" applyAlignment=\"1\"");
    }

    let mut s = format!(
        "<xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"{}",
        num_fmt_id, font_id, fill_id, border_id, attrs
    );
    if !aligned {
        s.push_str("/>");
        return s;
    }

    s.push_str("><alignment");
    if desc.horizontal != HorizontalAlignment::General {
        s.push_str(&format!(" horizontal=\"{}\"", desc.horizontal.xlsx_name()));
    }
    if desc.vertical != VerticalAlignment::Bottom {
        s.push_str(&format!(" vertical=\"{}\"", desc.vertical.xlsx_name()));
    }
    s.push_str("/></xf>");
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetstream_core::{BorderLineStyle, Style, StyleRegistry};

    #[test]
    fn test_default_stylesheet() {
        let registry = StyleRegistry::new();
        let xml = render_styles_xml(&registry.snapshot().unwrap());

        assert!(xml.contains("<fonts count=\"1\">"));
        assert!(xml.contains("<fills count=\"2\">"));
        assert!(xml.contains("patternType=\"gray125\""));
        assert!(xml.contains("<cellXfs count=\"1\">"));
        assert!(!xml.contains("<numFmts"));
    }

    #[test]
    fn test_registered_styles() {
        let registry = StyleRegistry::new();
        registry
            .register_style(
                &Style::new()
                    .bold(true)
                    .fill_color(Color::YELLOW)
                    .border(BorderStyle::all(BorderLineStyle::Thin, Color::BLACK))
                    .number_format("0.0 \"kg\"")
                    .horizontal_alignment(HorizontalAlignment::Center),
            )
            .unwrap();
        let xml = render_styles_xml(&registry.snapshot().unwrap());

        assert!(xml.contains(
            "<numFmt numFmtId=\"164\" formatCode=\"0.0 &quot;kg&quot;\"/>"
        ));
        assert!(xml.contains("<b/>"));
        assert!(xml.contains("<fgColor rgb=\"FFFFFF00\"/>"));
        assert!(xml.contains("<left style=\"thin\"><color rgb=\"FF000000\"/></left>"));
        assert!(xml.contains(
            "<xf numFmtId=\"164\" fontId=\"1\" fillId=\"2\" borderId=\"1\" xfId=\"0\" applyNumberFormat=\"1\" applyFont=\"1\" applyFill=\"1\" applyBorder=\"1\" applyAlignment=\"1\"><alignment horizontal=\"center\"/></xf>"
        ));
    }

    #[test]
    fn test_missing_component_falls_back() {
        let registry = StyleRegistry::new();
        registry
            .register(&StyleDescriptor::new().with_font(9))
            .unwrap();
        let xml = render_styles_xml(&registry.snapshot().unwrap());
        assert!(xml.contains("<xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/>"));
        assert!(xml.contains("<cellXfs count=\"2\">"));
    }

    #[test]
    fn test_unknown_custom_number_format_falls_back() {
        let registry = StyleRegistry::new();
        registry
            .register_style(&Style::new().number_format("0.000"))
            .unwrap();
        registry
            .register(&StyleDescriptor::new().with_number_format(200))
            .unwrap();
        registry
            .register(&StyleDescriptor::new().with_number_format(14))
            .unwrap();
        let xml = render_styles_xml(&registry.snapshot().unwrap());

        assert!(xml.contains("<numFmts count=\"1\">"));
        assert!(!xml.contains("numFmtId=\"200\""));
        assert!(xml.contains(
            "<xf numFmtId=\"164\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyNumberFormat=\"1\"/>"
        ));
        assert!(xml.contains(
            "<xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/>"
        ));
        // Built-in ids need no numFmt entry
        assert!(xml.contains(
            "<xf numFmtId=\"14\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyNumberFormat=\"1\"/>"
        ));
        assert!(xml.contains("<cellXfs count=\"4\">"));
    }
}
