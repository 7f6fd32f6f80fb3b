use crate::identity::{AddressParts, DecodeError, IdentityDecoder, IdentityFields, Identifier, PayloadFormat};
use crate::qr::RawPayload;
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// 旧版条码的根元素
pub const ROOT_ELEMENT: &str = "PrintLetterBarcodeData";

/// 旧版 XML 解码器，身份信息是根元素的属性
#[derive(Clone, Copy, Debug, Default)]
pub struct LegacyXmlDecoder;

impl LegacyXmlDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl IdentityDecoder for LegacyXmlDecoder {
    fn format(&self) -> PayloadFormat {
        PayloadFormat::LegacyXml
    }

    fn decode(&self, payload: &RawPayload) -> Result<IdentityFields, DecodeError> {
        let (root, attrs) = parse_root(payload.as_str())?;

        if root != ROOT_ELEMENT {
            return Err(DecodeError::MissingContainer(format!("unexpected root <{}>", root)));
        }
        if attrs.is_empty() {
            return Err(DecodeError::MissingContainer(format!("<{}> has no attributes", root)));
        }
        debug!("Legacy XML root carries {} attributes", attrs.len());

        let lookup = |names: &[&str]| -> Option<String> {
            names
                .iter()
                .filter_map(|name| attrs.get(*name))
                .find(|value| !value.is_empty())
                .cloned()
        };

        let identifier = Identifier::full(lookup(&["uid"]).as_deref().unwrap_or(""))?;

        let address = AddressParts {
            house: lookup(&["house"]),
            street: lookup(&["street"]),
            vtc: lookup(&["vtc"]),
            district: lookup(&["dist", "d"]),
            state: lookup(&["state"]),
            pincode: lookup(&["pc", "p"]),
        };

        Ok(IdentityFields::new(lookup(&["name"]), &address, identifier))
    }
}

/// 解析文档，返回唯一根元素的名称与属性
fn parse_root(text: &str) -> Result<(String, HashMap<String, String>), DecodeError> {
    let mut reader = Reader::from_str(text);
    let mut root: Option<(String, HashMap<String, String>)> = None;
    let mut depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            DecodeError::MalformedXml(format!("at position {}: {}", reader.buffer_position(), e))
        })?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if depth == 0 {
                    if root.is_some() {
                        return Err(DecodeError::MalformedXml("multiple root elements".to_string()));
                    }
                    root = Some(read_element(e)?);
                }
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
            }
            Event::Text(ref t) if depth == 0 => {
                if !String::from_utf8_lossy(t).trim().is_empty() {
                    return Err(DecodeError::MalformedXml("text outside the root element".to_string()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(DecodeError::MalformedXml("unclosed element".to_string()));
    }

    root.ok_or_else(|| DecodeError::MalformedXml("no root element".to_string()))
}

fn read_element(e: &BytesStart) -> Result<(String, HashMap<String, String>), DecodeError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

    let mut attrs = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| DecodeError::MalformedXml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| DecodeError::MalformedXml(e.to_string()))?;
        attrs.insert(key, value.trim().to_string());
    }

    Ok((name, attrs))
}
