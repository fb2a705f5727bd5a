//! Property-based tests for URL normalization and insert preparation.

use bookmark_sync::managers::mutation_submitter::{normalize_url, prepare_insert};
use proptest::prelude::*;

fn arb_host_path() -> impl Strategy<Value = String> {
    ("[a-z][a-z0-9]{1,12}", "(\\.com|\\.org|\\.io)", proptest::option::of("/[a-z0-9]{1,8}"))
        .prop_map(|(host, tld, path)| format!("{}{}{}", host, tld, path.unwrap_or_default()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Bare hosts gain https://.
    #[test]
    fn bare_host_gets_https(rest in arb_host_path()) {
        prop_assert_eq!(normalize_url(&rest), format!("https://{}", rest));
    }

    // An explicit http or https scheme is kept as typed.
    #[test]
    fn explicit_scheme_is_preserved(
        scheme in prop_oneof![Just("http://"), Just("https://")],
        rest in arb_host_path(),
    ) {
        let url = format!("{}{}", scheme, rest);
        prop_assert_eq!(normalize_url(&url), url);
    }

    // Normalizing twice changes nothing more.
    #[test]
    fn normalization_is_idempotent(raw in "[ ]{0,3}[a-zA-Z0-9:/._-]{1,30}[ ]{0,3}") {
        let once = normalize_url(&raw);
        prop_assert_eq!(normalize_url(&once), once.clone());
        prop_assert!(once.starts_with("http://") || once.starts_with("https://"));
    }

    // Surrounding whitespace never reaches the stored record.
    #[test]
    fn prepared_fields_are_trimmed(
        title in "[a-zA-Z][a-zA-Z0-9 ]{0,20}[a-zA-Z0-9]",
        rest in arb_host_path(),
        pad in "[ \\t]{0,4}",
    ) {
        let new = prepare_insert("u1", &format!("{}{}{}", pad, title, pad), &format!("{}{}{}", pad, rest, pad))
            .expect("non-empty input is valid");
        prop_assert_eq!(new.title, title);
        prop_assert_eq!(new.url, format!("https://{}", rest));
    }
}
