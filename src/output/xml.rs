use crate::bundle::ContextBundle;
use crate::content::RenderedFile;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::error::Error;
use std::io::Cursor;

pub fn render(bundle: &ContextBundle) -> Result<String, Box<dyn Error>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let root = BytesStart::new("context");
    writer.write_event(Event::Start(root.borrow()))?;

    write_element(&mut writer, "project", &bundle.project)?;
    if let Some(ref request) = bundle.request {
        write_element(&mut writer, "request", request)?;
    }

    if let Some(ref profile) = bundle.profile {
        writer.write_event(Event::Start(BytesStart::new("profile")))?;
        let fields = [
            ("language", &profile.language),
            ("framework", &profile.framework),
            ("styling", &profile.styling),
            ("validation", &profile.validation),
            ("testing", &profile.testing),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                write_element(&mut writer, name, value)?;
            }
        }
        for pattern in &profile.patterns {
            write_element(&mut writer, "pattern", pattern)?;
        }
        writer.write_event(Event::End(BytesEnd::new("profile")))?;
    }

    if !bundle.constraints.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("constraints")))?;
        for c in &bundle.constraints.tech {
            write_element(&mut writer, "tech", c)?;
        }
        for c in &bundle.constraints.negative {
            write_element(&mut writer, "negative", c)?;
        }
        writer.write_event(Event::End(BytesEnd::new("constraints")))?;
    }

    if let Some(ref name) = bundle.scope_function {
        write_element(&mut writer, "scope_function", name)?;
    }
    write_list(&mut writer, "activity", "path", &bundle.activity)?;
    write_list(&mut writer, "warnings", "warning", &bundle.warnings)?;

    write_element(&mut writer, "files_shown", &bundle.files_shown.to_string())?;
    write_element(&mut writer, "total_lines", &bundle.total_lines.to_string())?;

    if !bundle.skipped.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("skipped")))?;
        for skipped in &bundle.skipped {
            let mut elem = BytesStart::new("file");
            elem.push_attribute(("path", skipped.path.as_str()));
            elem.push_attribute(("reason", skipped.reason.as_str()));
            writer.write_event(Event::Empty(elem))?;
        }
        writer.write_event(Event::End(BytesEnd::new("skipped")))?;
    }

    let files = BytesStart::new("files");
    writer.write_event(Event::Start(files.borrow()))?;
    for file in &bundle.files {
        write_file_element(&mut writer, file)?;
    }
    writer.write_event(Event::End(BytesEnd::new("files")))?;

    writer.write_event(Event::End(BytesEnd::new("context")))?;

    let result = writer.into_inner().into_inner();
    Ok(String::from_utf8(result)?)
}

fn write_file_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    file: &RenderedFile,
) -> Result<(), Box<dyn Error>> {
    let mut elem = BytesStart::new("file");
    elem.push_attribute(("path", file.path.as_str()));
    elem.push_attribute(("role", file.role.as_str()));
    elem.push_attribute(("mode", file.mode.as_str()));
    elem.push_attribute(("lines", file.lines.to_string().as_str()));
    if let Some(ref hash) = file.hash {
        elem.push_attribute(("hash", hash.as_str()));
    }
    if let Some(tokens) = file.tokens {
        elem.push_attribute(("tokens", tokens.to_string().as_str()));
    }

    if let Some(ref content) = file.content {
        writer.write_event(Event::Start(elem.borrow()))?;

        let content_elem = BytesStart::new("content");
        writer.write_event(Event::Start(content_elem.borrow()))?;
        for piece in cdata_pieces(content) {
            writer.write_event(Event::CData(BytesCData::new(piece)))?;
        }
        writer.write_event(Event::End(BytesEnd::new("content")))?;

        writer.write_event(Event::End(BytesEnd::new("file")))?;
    } else {
        writer.write_event(Event::Empty(elem))?;
    }

    Ok(())
}

/// Splits text so that no piece contains the CDATA terminator.
fn cdata_pieces(content: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = content;
    while let Some(pos) = rest.find("]]>") {
        pieces.push(&rest[..pos + 2]);
        rest = &rest[pos + 2..];
    }
    pieces.push(rest);
    pieces
}

fn write_list<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    item: &str,
    values: &[String],
) -> Result<(), Box<dyn Error>> {
    if values.is_empty() {
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    for value in values {
        write_element(writer, item, value)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    content: &str,
) -> Result<(), Box<dyn Error>> {
    let elem = BytesStart::new(name);
    writer.write_event(Event::Start(elem.borrow()))?;
    writer.write_event(Event::Text(BytesText::new(content)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
