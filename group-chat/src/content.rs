//! Message and request bodies
//!
//! A [`Content`] is a typed body as carried by SIP requests. Chat traffic
//! must be CPIM-encapsulated; participant lists travel as RFC 4826
//! resource-lists documents with the `recipient-list` disposition.
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use crate::error::{ChatRoomError, ChatRoomResult};
use parley_types::SipAddress;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::fmt;
use std::io::Cursor;
use tracing::warn;

/// Disposition marking a resource list as the participants to add
pub const RECIPIENT_LIST_DISPOSITION: &str = "recipient-list";

const RESOURCE_LISTS_NAMESPACE: &str = "urn:ietf:params:xml:ns:resource-lists";

/// MIME type of a body, parameters included.
///
/// Equality compares `type/subtype` case-insensitively and ignores
/// parameters such as `charset`.
#[derive(Debug, Clone)]
pub struct ContentType(Cow<'static, str>);

impl ContentType {
    pub const CPIM: ContentType = ContentType(Cow::Borrowed("message/cpim"));
    pub const RESOURCE_LISTS: ContentType =
        ContentType(Cow::Borrowed("application/resource-lists+xml"));
    pub const PLAIN_TEXT: ContentType = ContentType(Cow::Borrowed("text/plain"));

    pub fn new(value: impl Into<String>) -> Self {
        ContentType(Cow::Owned(value.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `type/subtype` without parameters
    pub fn mime_type(&self) -> &str {
        self.0.split(';').next().unwrap_or_default().trim()
    }
}

impl PartialEq for ContentType {
    fn eq(&self, other: &Self) -> bool {
        self.mime_type().eq_ignore_ascii_case(other.mime_type())
    }
}

impl Eq for ContentType {}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub content_type: ContentType,
    pub disposition: Option<String>,
    pub body: String,
}

impl Content {
    pub fn new(content_type: ContentType, body: impl Into<String>) -> Self {
        Self {
            content_type,
            disposition: None,
            body: body.into(),
        }
    }

    pub fn with_disposition(mut self, disposition: impl Into<String>) -> Self {
        self.disposition = Some(disposition.into());
        self
    }

    /// Resource list naming participants to add
    pub fn is_recipient_list(&self) -> bool {
        self.content_type == ContentType::RESOURCE_LISTS
            && self.disposition.as_deref() == Some(RECIPIENT_LIST_DISPOSITION)
    }
}

/// Extract the `uri` of every `<entry>` in a resource-lists document.
///
/// Entries whose URI is not a valid address are skipped.
pub fn parse_resource_lists(xml: &str) -> ChatRoomResult<Vec<SipAddress>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut addresses = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"entry" => {
                for attr in e.attributes() {
                    let attr = attr.map_err(xml_error)?;
                    if attr.key.local_name().as_ref() != b"uri" {
                        continue;
                    }
                    let uri = attr.unescape_value().map_err(xml_error)?;
                    match SipAddress::parse(&uri) {
                        Ok(address) => addresses.push(address),
                        Err(err) => warn!(uri = %uri, error = %err, "Skipping invalid resource list entry"),
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(addresses)
}

/// Render a resource-lists document with one entry per address
pub fn format_resource_lists(addresses: &[SipAddress]) -> ChatRoomResult<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;

    let mut root = BytesStart::new("resource-lists");
    root.push_attribute(("xmlns", RESOURCE_LISTS_NAMESPACE));
    writer.write_event(Event::Start(root)).map_err(xml_error)?;
    writer
        .write_event(Event::Start(BytesStart::new("list")))
        .map_err(xml_error)?;

    for address in addresses {
        let uri = address.uri_string();
        let mut entry = BytesStart::new("entry");
        entry.push_attribute(("uri", uri.as_str()));
        writer.write_event(Event::Empty(entry)).map_err(xml_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("list")))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new("resource-lists")))
        .map_err(xml_error)?;

    String::from_utf8(writer.into_inner().into_inner()).map_err(xml_error)
}

fn xml_error(e: impl fmt::Display) -> ChatRoomError {
    ChatRoomError::MalformedContent(e.to_string())
}
