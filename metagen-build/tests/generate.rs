use std::fs;
use std::path::{Path, PathBuf};

use metagen_build::generate_metamodel;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn compact(source: &str) -> String {
    source.chars().filter(|c| !c.is_whitespace()).collect()
}

const MODEL: &str = r#"
use metagen::Entity;
use std::collections::BTreeSet;

#[derive(Entity)]
pub struct Person {
    pub name: String,
    pub age: u32,
    pub tags: BTreeSet<String>,
    #[metamodel(many_to_one)]
    pub parent: Option<Person>,
}

pub enum Mood {
    Calm,
}
"#;

#[test]
fn generates_one_module_per_entity_and_an_index() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let out = dir.path().join("metamodel");
    write(&src, "model.rs", MODEL);

    let report = generate_metamodel()
        .scan_path(&src)
        .output_dir(&out)
        .run()
        .unwrap();

    assert_eq!(report.written, ["Person_"]);
    assert_eq!(report.rounds, 1);
    // Module and index.
    assert_eq!(report.changed, 2);
    assert_eq!(report.rerun_if_changed, [src.clone()]);

    let source = fs::read_to_string(out.join("person_.rs")).unwrap();
    let compact = compact(&source);
    assert!(compact.contains("pubstructPerson_;"));
    assert!(compact.contains("pubconstNAME:&'staticstr=\"name\";"));
    assert!(compact.contains("SetAttribute<crate::model::Person,::std::string::String>"));
    assert!(compact.contains("fnjoin_parent("));

    let index = fs::read_to_string(out.join("mod.rs")).unwrap();
    assert!(index.contains("pub mod person_;\npub use person_::*;\n"));
}

#[test]
fn rerunning_unchanged_sources_touches_nothing() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let out = dir.path().join("metamodel");
    write(&src, "model.rs", MODEL);

    let first = generate_metamodel().scan_path(&src).output_dir(&out).run().unwrap();
    let before = fs::read_to_string(out.join("person_.rs")).unwrap();
    let second = generate_metamodel().scan_path(&src).output_dir(&out).run().unwrap();

    assert_eq!(first.changed, 2);
    assert_eq!(second.changed, 0);
    assert_eq!(second.written, first.written);
    assert_eq!(fs::read_to_string(out.join("person_.rs")).unwrap(), before);
}

#[test]
fn output_inside_the_scanned_tree_is_not_rescanned() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    write(&src, "model.rs", MODEL);

    for _ in 0..2 {
        let report = generate_metamodel()
            .scan_path(&src)
            .output_dir(src.join("metamodel"))
            .run()
            .unwrap();
        assert_eq!(report.written, ["Person_"]);
    }
}

#[test]
fn entities_waiting_on_a_later_path_are_generated_once_it_loads() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    let out = dir.path().join("metamodel");
    write(
        &first,
        "people.rs",
        r#"
        #[derive(metagen::Entity)]
        pub struct Resident {
            pub name: String,
            #[metamodel(many_to_one)]
            pub home: crate::places::Address,
        }
        "#,
    );
    write(
        &second,
        "places.rs",
        r#"
        #[derive(metagen::Entity)]
        pub struct Address {
            pub city: String,
        }
        "#,
    );

    let report = generate_metamodel()
        .scan_path(&first)
        .scan_path(&second)
        .output_dir(&out)
        .run()
        .unwrap();

    assert_eq!(report.rounds, 2);
    assert_eq!(report.written.len(), 2);
    assert!(report.written.contains(&"Resident_".to_string()));
    assert!(report.written.contains(&"Address_".to_string()));

    let resident = compact(&fs::read_to_string(out.join("resident_.rs")).unwrap());
    assert!(resident.contains("Join<X,crate::places::Address>"));
}

#[test]
fn unresolvable_entities_fail_the_run() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    write(
        &src,
        "model.rs",
        r#"
        #[derive(metagen::Entity)]
        pub struct Orphan {
            pub missing: Nowhere,
        }
        "#,
    );

    let result = generate_metamodel()
        .scan_path(&src)
        .output_dir(dir.path().join("metamodel"))
        .run();

    assert!(result.is_err());
    assert!(!dir.path().join("metamodel/orphan_.rs").exists());
}

#[test]
fn library_supertypes_are_inherited_but_not_generated() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("base/src");
    let src = dir.path().join("app/src");
    let out = dir.path().join("metamodel");
    write(
        &library,
        "audit.rs",
        r#"
        #[derive(metagen::MappedSuperclass)]
        pub struct Audited {
            pub created_by: String,
        }
        "#,
    );
    write(
        &src,
        "invoice.rs",
        r#"
        #[derive(metagen::Entity)]
        #[metamodel(extends = "base::audit::Audited")]
        pub struct Invoice {
            pub total: i64,
        }
        "#,
    );

    let report = generate_metamodel()
        .scan_path(&src)
        .library_path(&library, "base")
        .output_dir(&out)
        .run()
        .unwrap();

    assert_eq!(report.written, ["Invoice_"]);
    assert!(!out.join("audited_.rs").exists());
    assert!(report.rerun_if_changed.contains(&library));

    let invoice = compact(&fs::read_to_string(out.join("invoice_.rs")).unwrap());
    assert!(invoice.contains("pubconstCREATED_BY:&'staticstr=\"created_by\";"));
    assert!(invoice.contains("impl::metagen::criteria::Extends<base::audit::Audited>forcrate::invoice::Invoice{}"));
    assert!(!invoice.contains("pubconstcreated_by:"));
}

#[test]
fn entities_sharing_a_simple_name_fail_instead_of_overwriting() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let out = dir.path().join("metamodel");
    write(
        &src,
        "billing/account.rs",
        r#"
        #[derive(metagen::Entity)]
        pub struct Account {
            pub iban: String,
        }
        "#,
    );
    write(
        &src,
        "crm/account.rs",
        r#"
        #[derive(metagen::Entity)]
        pub struct Account {
            pub email: String,
        }
        "#,
    );

    let err = generate_metamodel()
        .scan_path(&src)
        .output_dir(&out)
        .run()
        .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("account_.rs"), "{message}");
    assert!(message.contains("crate::billing::account::Account"), "{message}");
    assert!(message.contains("crate::crm::account::Account"), "{message}");
    assert!(!out.join("account_.rs").exists());
}
