//! Minimal TwiML voice response builder

use crate::error::Result;
use anyhow::Context;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Document sent when a response cannot be rendered
pub const EMPTY_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#;

/// TwiML verb supported by the gatekeeper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verb {
    Say { voice: Option<String>, text: String },
    Play { url: String },
    Hangup,
    Redirect { url: String },
}

/// Ordered list of verbs rendered as a `<Response>` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say {
            voice: None,
            text: text.into(),
        });
        self
    }

    pub fn say_with_voice(mut self, voice: impl Into<String>, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say {
            voice: Some(voice.into()),
            text: text.into(),
        });
        self
    }

    pub fn play(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Play { url: url.into() });
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn redirect(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Redirect { url: url.into() });
        self
    }

    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    /// Render the response as a TwiML document
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .context("Failed to write XML declaration")?;
        writer
            .write_event(Event::Start(BytesStart::new("Response")))
            .context("Failed to open Response element")?;

        for verb in &self.verbs {
            match verb {
                Verb::Say { voice, text } => {
                    let mut say = BytesStart::new("Say");
                    if let Some(voice) = voice {
                        say.push_attribute(("voice", voice.as_str()));
                    }
                    write_text_element(&mut writer, say, "Say", text)?;
                }
                Verb::Play { url } => {
                    write_text_element(&mut writer, BytesStart::new("Play"), "Play", url)?;
                }
                Verb::Hangup => {
                    writer
                        .write_event(Event::Empty(BytesStart::new("Hangup")))
                        .context("Failed to write Hangup element")?;
                }
                Verb::Redirect { url } => {
                    write_text_element(&mut writer, BytesStart::new("Redirect"), "Redirect", url)?;
                }
            }
        }

        writer
            .write_event(Event::End(BytesEnd::new("Response")))
            .context("Failed to close Response element")?;

        let xml = String::from_utf8(writer.into_inner().into_inner())
            .context("Rendered TwiML is not valid UTF-8")?;
        Ok(xml)
    }
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    start: BytesStart<'_>,
    name: &str,
    text: &str,
) -> Result<()> {
    writer
        .write_event(Event::Start(start))
        .with_context(|| format!("Failed to open {} element", name))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .with_context(|| format!("Failed to write {} text", name))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("Failed to close {} element", name))?;
    Ok(())
}

impl std::fmt::Display for VoiceResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let xml = self.to_xml().map_err(|_| std::fmt::Error)?;
        f.write_str(&xml)
    }
}
