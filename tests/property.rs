use pbxpatch::fix::fix_duplicate_paths;
use pbxpatch::splice::EditSet;
use pbxpatch::{Manifest, Ownership};
use proptest::prelude::*;

/// One group with a declared path and files stored with or without it.
fn manifest_text(group: &str, files: &[(String, bool)]) -> String {
    let mut refs = String::new();
    let mut children = String::new();
    for (i, (name, prefixed)) in files.iter().enumerate() {
        let id = format!("B1{i:022}");
        let path = if *prefixed {
            format!("{group}/{name}")
        } else {
            name.clone()
        };
        refs.push_str(&format!(
            "\t\t{id} /* {name} */ = {{isa = PBXFileReference; path = {path}; sourceTree = \"<group>\"; }};\n"
        ));
        children.push_str(&format!("\t\t\t\t{id} /* {name} */,\n"));
    }
    format!(
        "// !$*UTF8*$!\n{{\n\tobjects = {{\n\n/* Begin PBXFileReference section */\n{refs}/* End PBXFileReference section */\n\n/* Begin PBXGroup section */\n\t\tC10000000000000000000001 /* {group} */ = {{\n\t\t\tisa = PBXGroup;\n\t\t\tchildren = (\n{children}\t\t\t);\n\t\t\tpath = {group};\n\t\t\tsourceTree = \"<group>\";\n\t\t}};\n/* End PBXGroup section */\n\t}};\n}}\n"
    )
}

fn ownership() -> impl Strategy<Value = Ownership> {
    prop_oneof![Just(Ownership::Tree), Just(Ownership::Prefix)]
}

proptest! {
    #[test]
    fn test_empty_edit_is_byte_identical(
        group in "[A-Z][a-zA-Z]{2,8}",
        files in prop::collection::vec(("[A-Z][a-z]{1,8}\\.swift", any::<bool>()), 0..8)
    ) {
        let text = manifest_text(&group, &files);
        let manifest = Manifest::parse(text.as_str()).unwrap();
        let edited = manifest.edit(&EditSet::new()).unwrap();
        prop_assert_eq!(edited.text(), text.as_str());
    }

    // Remainders live in lowercase subdirectories, so they never start with
    // the capitalised group path again. A doubled prefix takes one pass per
    // copy; see `plan_path_fixes`.
    #[test]
    fn test_prefix_fix_is_idempotent(
        group in "[A-Z][a-zA-Z]{2,8}",
        files in prop::collection::vec(("([a-z]{1,6}/)?[A-Z][a-z]{1,8}\\.swift", any::<bool>()), 1..8),
        mode in ownership()
    ) {
        let manifest = Manifest::parse(manifest_text(&group, &files)).unwrap();
        let (fixed, fixes) = fix_duplicate_paths(&manifest, mode).unwrap();
        prop_assert_eq!(fixes.len(), files.iter().filter(|(_, prefixed)| *prefixed).count());
        for fix in &fixes {
            let expected = format!("{}/", group);
            prop_assert!(!fix.new.starts_with(&expected));
        }

        let (again, more) = fix_duplicate_paths(&fixed, mode).unwrap();
        prop_assert!(more.is_empty());
        prop_assert_eq!(again.text(), fixed.text());
    }
}
