//! [`Messenger`] implementation backed by the Discord REST API.

use core::fmt::Display;
use lobby::messenger::{ChannelId, ControlSet, MessageId, Messenger, PlatformError};
use twilight_http::{error::ErrorType, Client};
use twilight_model::channel::message::{
    component::{ActionRow, Button, ButtonStyle},
    AllowedMentions, Component,
};

/// Discord allows at most five buttons per action row.
const BUTTONS_PER_ROW: usize = 5;

pub struct Discord {
    client: Client,
}

impl Discord {
    pub fn new(token: String) -> Self {
        Self { client: Client::new(token) }
    }
}

/// Lays out one button per option, wrapping into rows of five.
pub fn render(controls: &ControlSet, disabled: bool) -> Vec<Component> {
    let buttons: Vec<_> = controls
        .controls()
        .map(|(custom_id, label)| {
            Component::Button(Button {
                custom_id: Some(custom_id),
                disabled,
                emoji: None,
                label: Some(String::from(label)),
                style: ButtonStyle::Primary,
                url: None,
            })
        })
        .collect();
    buttons.chunks(BUTTONS_PER_ROW).map(|row| Component::ActionRow(ActionRow { components: row.to_vec() })).collect()
}

fn classify(err: twilight_http::Error) -> PlatformError {
    match err.kind() {
        ErrorType::Response { status, .. } => match status.get() {
            403 => PlatformError::Forbidden,
            404 => PlatformError::Gone,
            429 => PlatformError::RateLimited,
            _ => PlatformError::Unavailable(err.to_string().into_boxed_str()),
        },
        _ => PlatformError::Unavailable(err.to_string().into_boxed_str()),
    }
}

fn rejected(err: impl Display) -> PlatformError {
    PlatformError::Unavailable(err.to_string().into_boxed_str())
}

impl Messenger for Discord {
    async fn send(
        &self,
        channel: ChannelId,
        content: &str,
        controls: Option<&ControlSet>,
    ) -> Result<MessageId, PlatformError> {
        let components = controls.map(|controls| render(controls, false)).unwrap_or_default();
        let mentions = AllowedMentions::default();
        let response = self
            .client
            .create_message(channel)
            .allowed_mentions(Some(&mentions))
            .content(content)
            .map_err(rejected)?
            .components(&components)
            .map_err(rejected)?
            .await
            .map_err(classify)?;
        let message =
            response.model().await.map_err(|err| PlatformError::Unavailable(err.to_string().into_boxed_str()))?;
        Ok(message.id)
    }

    async fn edit(&self, channel: ChannelId, message: MessageId, content: &str) -> Result<(), PlatformError> {
        self.client
            .update_message(channel, message)
            .content(Some(content))
            .map_err(rejected)?
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn disable(&self, channel: ChannelId, message: MessageId, controls: &ControlSet) -> Result<(), PlatformError> {
        let components = render(controls, true);
        self.client
            .update_message(channel, message)
            .components(Some(components.as_slice()))
            .map_err(rejected)?
            .await
            .map_err(classify)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobby::messenger::Origin;

    fn labels(count: usize) -> Vec<Box<str>> {
        (0..count).map(|i| format!("Option {i}").into_boxed_str()).collect()
    }

    fn buttons(row: &Component) -> &[Component] {
        let Component::ActionRow(ActionRow { components }) = row else {
            panic!("expected an action row");
        };
        components
    }

    #[test]
    fn buttons_wrap_into_rows_of_five() {
        let controls = ControlSet::new(Origin { session: 0xab, question: 3 }, &labels(12));
        let rows = render(&controls, false);
        let sizes: Vec<_> = rows.iter().map(|row| buttons(row).len()).collect();
        assert_eq!(sizes, [5, 5, 2]);

        let Component::Button(first) = &buttons(&rows[0])[0] else {
            panic!("expected a button");
        };
        assert_eq!(first.custom_id.as_deref(), Some("ab:3:Option 0"));
        assert_eq!(first.label.as_deref(), Some("Option 0"));
        assert!(!first.disabled);
    }

    #[test]
    fn disabled_rendering_keeps_labels() {
        let controls = ControlSet::new(Origin { session: 1, question: 0 }, &labels(2));
        let rows = render(&controls, true);
        assert_eq!(rows.len(), 1);
        for (button, expected) in buttons(&rows[0]).iter().zip(["Option 0", "Option 1"]) {
            let Component::Button(button) = button else {
                panic!("expected a button");
            };
            assert!(button.disabled);
            assert_eq!(button.label.as_deref(), Some(expected));
        }
    }
}
