//! Auto-submitting hosted payment form.

use std::fmt::Display;

use maud::{PreEscaped, html};
use paynet_core::{encoding::hidden_fields, errors::EncodingError, types::FieldMap};
use url::Url;

/// Browsing context the form submits into unless told otherwise.
pub const DEFAULT_TARGET: &str = "_self";

const AUTO_SUBMIT: &str =
    "window.setTimeout(function () { document.forms.silentPost.submit(); }, 0);";

/// An HTML fragment ready to be embedded in a checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedForm(String);

impl RenderedForm {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for RenderedForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RenderedForm {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Render `fields` as hidden inputs of a form that posts itself to `action`.
///
/// Fields appear in the map's order, nested values flattened to bracketed
/// names. Browsers without scripting get a "Continue" button instead.
/// Fields whose flattened names collide are rejected.
///
/// ```
/// use paynet_core::types::FieldMap;
/// use paynet_kit::form::{DEFAULT_TARGET, render_silent_post};
///
/// let action = "https://gateway.example.com/hosted/".parse().unwrap();
/// let fields = FieldMap::new().with("amount", 1001).with("orderRef", "Tom & Jerry");
///
/// let form = render_silent_post(&action, &fields, DEFAULT_TARGET).unwrap();
/// assert!(form.as_str().contains(r#"<input type="hidden" name="orderRef" value="Tom &amp; Jerry">"#));
/// ```
pub fn render_silent_post(
    action: &Url,
    fields: &FieldMap,
    target: &str,
) -> Result<RenderedForm, EncodingError> {
    let hidden = hidden_fields(fields)?;

    let markup = html! {
        form id="silentPost" action=(action.as_str()) method="post" target=(target) {
            @for (name, value) in hidden {
                input type="hidden" name=(PreEscaped(name)) value=(PreEscaped(value));
            }
            noscript {
                input type="submit" value="Continue";
            }
        }
        script {
            (PreEscaped(AUTO_SUBMIT))
        }
    };

    Ok(RenderedForm(markup.into_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action() -> Url {
        "https://gateway.example.com/hosted/?a=1&b=2".parse().unwrap()
    }

    #[test]
    fn test_form_shape() {
        let fields = FieldMap::new().with("merchantID", "100001").with("amount", 1001);

        let form = render_silent_post(&action(), &fields, DEFAULT_TARGET).unwrap();

        assert_eq!(
            form.as_str(),
            concat!(
                r#"<form id="silentPost" action="https://gateway.example.com/hosted/?a=1&amp;b=2" method="post" target="_self">"#,
                r#"<input type="hidden" name="merchantID" value="100001">"#,
                r#"<input type="hidden" name="amount" value="1001">"#,
                r#"<noscript><input type="submit" value="Continue"></noscript>"#,
                r#"</form>"#,
                r#"<script>window.setTimeout(function () { document.forms.silentPost.submit(); }, 0);</script>"#,
            )
        );
    }

    #[test]
    fn test_values_escaped_once() {
        let fields = FieldMap::new()
            .with("customerAddress", FieldMap::new().with("line1", "1 \"Main\" St\r\n<b>"));

        let form = render_silent_post(&action(), &fields, "_top").unwrap();

        assert!(form.as_str().contains(
            r#"name="customerAddress[line1]" value="1 &quot;Main&quot; St&#13;&#10;&lt;b&gt;""#
        ));
        assert!(form.as_str().contains(r#"target="_top""#));
        assert!(!form.as_str().contains("&amp;quot;"));
    }

    #[test]
    fn test_colliding_fields_are_not_rendered() {
        let fields = FieldMap::new()
            .with("addr", FieldMap::new().with("city", "Leeds"))
            .with("addr[city]", "York");

        assert_eq!(
            render_silent_post(&action(), &fields, DEFAULT_TARGET),
            Err(EncodingError::DuplicateField("addr[city]".to_owned()))
        );
    }
}
