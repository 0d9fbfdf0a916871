use map2struct::StructTag;
use proptest::prelude::*;

fn key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

fn value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_,]{0,12}"
}

proptest! {
    #[test]
    fn prop_well_formed_pairs_survive(pairs in prop::collection::vec((key(), value()), 0..5)) {
        let raw = pairs
            .iter()
            .map(|(k, v)| format!("{k}:\"{v}\""))
            .collect::<Vec<_>>()
            .join(" ");
        let tag = StructTag::parse(&raw);

        let parsed: Vec<(String, String)> = tag
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        prop_assert_eq!(&parsed, &pairs);

        for (k, _) in &pairs {
            let first = pairs.iter().find(|(other, _)| other == k).map(|(_, v)| v.as_str());
            prop_assert_eq!(tag.get(k), first);
        }
    }

    #[test]
    fn prop_key_name_is_prefix_before_comma(name in "[a-z_]{1,10}", opts in "(,[a-z]{1,8}){0,3}") {
        let tag = StructTag::parse(&format!("json:\"{name}{opts}\""));
        prop_assert_eq!(tag.key_name("json"), name);
        prop_assert_eq!(tag.key_name("xml"), "");
    }

    #[test]
    fn prop_parse_never_panics(raw in ".{0,40}") {
        let _ = StructTag::parse(&raw);
    }
}
