use paynet_core::errors::SignatureError;
use paynet_kit::{
    errors::Error,
    response::{ResponseOutcome, ResponseVerifier},
    signature,
    types::FieldMap,
};
use proptest::prelude::*;

const SECRET: &str = "Circle4Take40Idea";

fn signed(mut fields: FieldMap) -> FieldMap {
    let signature = signature::sign(&fields, SECRET, None).unwrap();
    fields.insert("signature", signature);
    fields
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_declines_carry_code_and_message(
        code in (1i64..100_000).prop_filter("not a step-up", |code| *code != 65802),
        message in "[ -~]{0,40}",
    ) {
        let response = signed(
            FieldMap::new()
                .with("responseCode", code)
                .with("responseMessage", message.as_str()),
        );

        let outcome = ResponseVerifier::new(Some(SECRET.into())).verify(response).unwrap();

        match outcome {
            ResponseOutcome::Declined(decline) => {
                prop_assert_eq!(decline.code.0, code);
                prop_assert_eq!(decline.message, message);
            }
            other => prop_assert!(false, "expected a decline, got {:?}", other),
        }
    }

    #[test]
    fn test_edited_message_is_rejected(
        message in "[ -~]{0,40}",
        edit in "[ -~]{1,8}",
    ) {
        let mut response = signed(
            FieldMap::new()
                .with("responseCode", "0")
                .with("responseMessage", message.as_str()),
        );
        response.insert("responseMessage", format!("{message}{edit}"));

        let result = ResponseVerifier::new(Some(SECRET.into())).verify(response);

        prop_assert!(matches!(result, Err(Error::Signature(SignatureError::Mismatch))));
    }
}
