//! Verification and dispatch of gateway responses.

use paynet_core::{
    encoding::escape_markup,
    errors::{ProtocolError, SignatureError},
    signature::{self, Signature},
    types::{FieldMap, FieldValue, ResponseCode, field_names},
};

use crate::{
    config::{GatewayConfig, MerchantSecret},
    errors::{Error, Result},
};

/// A 3-D Secure challenge the cardholder must complete before the payment continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepUp {
    /// `threeDSVersion` with the dots dropped, e.g. `"2.1.0"` is `210`.
    pub version: u32,
    pub fields: FieldMap,
}

/// A declined transaction.
///
/// The message is markup-escaped when displayed so it can go straight into
/// a checkout page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to take payment: {}", escape_markup(.message))]
pub struct Decline {
    pub code: ResponseCode,
    pub message: String,
    pub fields: FieldMap,
}

/// What a verified response means for the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Payment taken. Fields exclude the signature.
    Success(FieldMap),
    StepUpRequired(StepUp),
    Declined(Decline),
}

impl ResponseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseOutcome::Success(_))
    }

    pub fn fields(&self) -> &FieldMap {
        match self {
            ResponseOutcome::Success(fields) => fields,
            ResponseOutcome::StepUpRequired(step_up) => &step_up.fields,
            ResponseOutcome::Declined(decline) => &decline.fields,
        }
    }

    /// Short name of the variant, as used in audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            ResponseOutcome::Success(_) => "success",
            ResponseOutcome::StepUpRequired(_) => "step_up_required",
            ResponseOutcome::Declined(_) => "declined",
        }
    }

    /// Treat a decline as an error.
    pub fn into_result(self) -> Result<ResponseOutcome> {
        match self {
            ResponseOutcome::Declined(decline) => Err(Error::Declined(decline)),
            outcome => Ok(outcome),
        }
    }
}

/// Checks response signatures and classifies response codes.
#[derive(Debug, Clone)]
pub struct ResponseVerifier {
    secret: Option<MerchantSecret>,
}

impl ResponseVerifier {
    pub fn new(secret: Option<MerchantSecret>) -> Self {
        ResponseVerifier {
            secret: secret.filter(|secret| !secret.is_empty()),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.secret().cloned())
    }

    /// Verify and classify a response.
    ///
    /// ```
    /// use paynet_core::{signature, types::FieldMap};
    /// use paynet_kit::response::{ResponseOutcome, ResponseVerifier};
    ///
    /// let mut response = FieldMap::new()
    ///     .with("responseCode", "0")
    ///     .with("responseMessage", "AUTHCODE:123456");
    /// let signed = signature::sign(&response, "s3cr3t", None).unwrap();
    /// response.insert("signature", signed);
    ///
    /// let verifier = ResponseVerifier::new(Some("s3cr3t".into()));
    /// let outcome = verifier.verify(response).unwrap();
    ///
    /// assert!(matches!(&outcome, ResponseOutcome::Success(fields) if !fields.contains_key("signature")));
    /// ```
    pub fn verify(&self, mut response: FieldMap) -> Result<ResponseOutcome> {
        if !response.contains_key(field_names::RESPONSE_CODE) {
            return Err(ProtocolError::MissingResponseCode.into());
        }

        let supplied = response.remove(field_names::SIGNATURE);

        match &self.secret {
            Some(secret) => {
                let supplied = supplied
                    .as_ref()
                    .and_then(FieldValue::scalar_text)
                    .filter(|text| !text.is_empty())
                    .ok_or(SignatureError::Missing)?;
                let Ok(supplied) = supplied.parse::<Signature>();
                signature::verify(&response, secret.expose(), &supplied)?;
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!("No merchant secret configured; response signature not checked");
            }
        }

        let code = response
            .get(field_names::RESPONSE_CODE)
            .map(ResponseCode::try_from)
            .ok_or(ProtocolError::MissingResponseCode)??;

        #[cfg(feature = "tracing")]
        tracing::debug!("Gateway response verified: responseCode={code}");

        if code.requires_three_ds() {
            let version = three_ds_version(&response)?;
            return Ok(ResponseOutcome::StepUpRequired(StepUp {
                version,
                fields: response,
            }));
        }

        if code.is_success() {
            return Ok(ResponseOutcome::Success(response));
        }

        let message = response
            .get(field_names::RESPONSE_MESSAGE)
            .and_then(FieldValue::scalar_text)
            .map(|message| message.into_owned())
            .unwrap_or_default();

        Ok(ResponseOutcome::Declined(Decline {
            code,
            message,
            fields: response,
        }))
    }
}

fn three_ds_version(response: &FieldMap) -> std::result::Result<u32, ProtocolError> {
    let raw = response
        .get(field_names::THREE_DS_VERSION)
        .and_then(FieldValue::scalar_text)
        .unwrap_or_default();

    raw.replace('.', "")
        .parse::<u32>()
        .map_err(|_| ProtocolError::InvalidThreeDsVersion(raw.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "Circle4Take40Idea";

    fn signed(mut fields: FieldMap) -> FieldMap {
        let signature = signature::sign(&fields, SECRET, None).unwrap();
        fields.insert(field_names::SIGNATURE, signature);
        fields
    }

    fn verifier() -> ResponseVerifier {
        ResponseVerifier::new(Some(SECRET.into()))
    }

    #[test]
    fn test_success_strips_signature() {
        let response = signed(FieldMap::new().with("responseCode", "0").with("xref", "X1"));

        let outcome = verifier().verify(response).unwrap();

        assert_eq!(
            outcome,
            ResponseOutcome::Success(FieldMap::new().with("responseCode", "0").with("xref", "X1"))
        );
    }

    #[test]
    fn test_step_up_version() {
        let response = signed(
            FieldMap::new()
                .with("responseCode", 65802)
                .with("threeDSVersion", "2.1.0"),
        );

        let ResponseOutcome::StepUpRequired(step_up) = verifier().verify(response).unwrap() else {
            panic!("expected step-up");
        };
        assert_eq!(step_up.version, 210);
        assert!(!step_up.fields.contains_key("signature"));
    }

    #[test]
    fn test_step_up_without_version() {
        let response = signed(FieldMap::new().with("responseCode", "65802"));

        assert!(matches!(
            verifier().verify(response),
            Err(Error::Protocol(ProtocolError::InvalidThreeDsVersion(_)))
        ));
    }

    #[test]
    fn test_decline_message_is_escaped() {
        let response = signed(
            FieldMap::new()
                .with("responseCode", "5")
                .with("responseMessage", "CARD <DECLINED> & \"held\""),
        );

        let outcome = verifier().verify(response).unwrap();
        let ResponseOutcome::Declined(decline) = &outcome else {
            panic!("expected decline");
        };

        assert_eq!(decline.code, ResponseCode::DO_NOT_HONOR);
        assert_eq!(
            decline.to_string(),
            "Failed to take payment: CARD &lt;DECLINED&gt; &amp; &quot;held&quot;"
        );
        assert!(matches!(outcome.into_result(), Err(Error::Declined(_))));
    }

    #[test]
    fn test_missing_response_code() {
        let response = signed(FieldMap::new().with("responseMessage", "?"));
        let err = verifier().verify(response).unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::MissingResponseCode)));
        assert_eq!(err.to_string(), "Invalid response from Payment Gateway");
    }

    #[test]
    fn test_missing_signature() {
        let err = verifier()
            .verify(FieldMap::new().with("responseCode", "0"))
            .unwrap_err();
        assert!(matches!(err, Error::Signature(SignatureError::Missing)));
        assert_eq!(err.to_string(), "Incorrectly signed response from Payment Gateway");
    }

    #[test]
    fn test_tampered_response() {
        let mut response = signed(FieldMap::new().with("responseCode", "5"));
        response.insert("responseCode", "0");

        let err = verifier().verify(response).unwrap_err();
        assert!(matches!(err, Error::Signature(SignatureError::Mismatch)));
        assert_eq!(
            err.to_string(),
            "Incorrectly signed response from Payment Gateway (2)"
        );
    }

    #[test]
    fn test_partial_response_signature() {
        let mut response = FieldMap::new()
            .with("responseCode", "0")
            .with("amount", 1001)
            .with("note", "unsigned");
        let signature = signature::sign(
            &response,
            SECRET,
            Some(&"responseCode,amount".parse().unwrap()),
        )
        .unwrap();
        response.insert("signature", signature);
        response.insert("note", "changed in transit");

        assert!(verifier().verify(response).unwrap().is_success());
    }

    #[test]
    fn test_non_numeric_code_is_rejected() {
        let response = signed(FieldMap::new().with("responseCode", "OK"));
        assert!(matches!(
            verifier().verify(response),
            Err(Error::Protocol(ProtocolError::InvalidResponseCode(_)))
        ));
    }

    #[test]
    fn test_no_secret_skips_check() {
        let response = FieldMap::new()
            .with("responseCode", "0")
            .with("signature", "not-a-real-signature");

        let outcome = ResponseVerifier::new(None).verify(response).unwrap();

        assert_eq!(outcome, ResponseOutcome::Success(FieldMap::new().with("responseCode", "0")));
    }
}
