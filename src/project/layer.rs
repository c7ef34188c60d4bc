use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use uuid::Uuid;

pub const DEFAULT_PROVIDER: &str = "gdal";

/// A raster layer reference held by a project document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapLayer {
    pub id: String,
    pub name: String,
    pub source: String,
    pub provider: String,
}

impl MapLayer {
    /// A new layer with a freshly generated id.
    pub fn new(name: &str, source: &str, provider: &str) -> Self {
        Self {
            id: layer_id(name),
            name: name.to_string(),
            source: source.to_string(),
            provider: provider.to_string(),
        }
    }

    pub(crate) fn write_map_layer<W: Write>(&self, writer: &mut Writer<W>) -> quick_xml::Result<()> {
        let mut start = BytesStart::new("maplayer");
        start.push_attribute(("type", "raster"));
        start.push_attribute(("autoRefreshEnabled", "0"));
        start.push_attribute(("refreshOnNotifyEnabled", "0"));
        writer.write_event(Event::Start(start))?;
        text_element(writer, "id", &self.id)?;
        text_element(writer, "datasource", &self.source)?;
        text_element(writer, "layername", &self.name)?;
        text_element(writer, "provider", &self.provider)?;
        writer.write_event(Event::End(BytesEnd::new("maplayer")))?;
        writer.write_event(Event::Text(BytesText::new("\n")))?;
        Ok(())
    }

    pub(crate) fn write_tree_layer<W: Write>(&self, writer: &mut Writer<W>) -> quick_xml::Result<()> {
        let mut start = BytesStart::new("layer-tree-layer");
        start.push_attribute(("id", self.id.as_str()));
        start.push_attribute(("name", self.name.as_str()));
        start.push_attribute(("source", self.source.as_str()));
        start.push_attribute(("providerKey", self.provider.as_str()));
        start.push_attribute(("checked", "Qt::Checked"));
        start.push_attribute(("expanded", "1"));
        writer.write_event(Event::Start(start))?;
        writer.write_event(Event::Empty(BytesStart::new("customproperties")))?;
        writer.write_event(Event::End(BytesEnd::new("layer-tree-layer")))?;
        writer.write_event(Event::Text(BytesText::new("\n")))?;
        Ok(())
    }
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Layer ids take the form `<name>_<uuid>` with anything but ASCII
/// alphanumerics replaced by underscores.
pub fn layer_id(name: &str) -> String {
    let sanitize = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    };
    format!(
        "{}_{}",
        sanitize(name),
        sanitize(&Uuid::new_v4().hyphenated().to_string())
    )
}
