//! Translates decisions into TwiML responses

use crate::config::GatekeeperSettings;
use crate::decision::Decision;
use crate::error::Result;
use crate::twiml::response::VoiceResponse;
use tracing::error;

const WAIT_EXPERIENCE_PATH: &str = "/features/callback-and-voicemail/studio/wait-experience";

/// Fixed assets and endpoints referenced by the responses
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSettings {
    pub sample_audio_url: String,
    pub busy_message: String,
    pub say_voice: String,
    pub default_redirect_url: String,
    /// Domain (optionally with port) serving the wait experience
    pub callback_domain: String,
}

impl From<&GatekeeperSettings> for ResponseSettings {
    fn from(settings: &GatekeeperSettings) -> Self {
        Self {
            sample_audio_url: settings.sample_audio_url.clone(),
            busy_message: settings.busy_message.clone(),
            say_voice: settings.say_voice.clone(),
            default_redirect_url: settings.default_redirect_url.clone(),
            callback_domain: settings.callback_domain.clone(),
        }
    }
}

impl Default for ResponseSettings {
    fn default() -> Self {
        Self::from(&GatekeeperSettings::default())
    }
}

/// Builds the voice response for a decision; never fails
#[derive(Debug, Clone)]
pub struct ResponseEmitter {
    settings: ResponseSettings,
}

impl ResponseEmitter {
    pub fn new(settings: ResponseSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ResponseSettings {
        &self.settings
    }

    pub fn emit(&self, decision: &Decision) -> VoiceResponse {
        match decision {
            Decision::PlaySample => VoiceResponse::new().play(&self.settings.sample_audio_url),
            Decision::AnnounceBusy => VoiceResponse::new()
                .say(&self.settings.busy_message)
                .hangup(),
            Decision::AnnounceWaitThenCallbackRedirect {
                announcement,
                queue_sid,
                call_sid,
            } => {
                let url = match self.callback_url(queue_sid, call_sid) {
                    Ok(url) => url,
                    Err(e) => {
                        error!(
                            "Failed to build callback redirect for domain '{}': {}",
                            self.settings.callback_domain, e
                        );
                        self.settings.default_redirect_url.clone()
                    }
                };
                self.announce(announcement.as_deref()).redirect(url)
            }
            Decision::AnnounceWaitThenDefaultRedirect { announcement }
            | Decision::DefaultRedirectOnly { announcement } => self
                .announce(announcement.as_deref())
                .redirect(&self.settings.default_redirect_url),
        }
    }

    /// The response used when anything upstream failed
    pub fn fallback(&self) -> VoiceResponse {
        self.emit(&Decision::fallback())
    }

    fn announce(&self, announcement: Option<&str>) -> VoiceResponse {
        match announcement {
            Some(message) => VoiceResponse::new().say_with_voice(&self.settings.say_voice, message),
            None => VoiceResponse::new(),
        }
    }

    fn callback_url(&self, queue_sid: &str, call_sid: &str) -> Result<String> {
        let base = format!(
            "https://{}{}",
            self.settings.callback_domain, WAIT_EXPERIENCE_PATH
        );
        let url = reqwest::Url::parse_with_params(
            &base,
            &[
                ("mode", "opt-out-choice"),
                ("QueueSid", queue_sid),
                ("CallSid", call_sid),
            ],
        )?;
        Ok(url.into())
    }
}

impl Default for ResponseEmitter {
    fn default() -> Self {
        Self::new(ResponseSettings::default())
    }
}
