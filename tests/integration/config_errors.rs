// tests/integration/config_errors.rs

use std::io::Write;

use tempfile::NamedTempFile;

use seqdag::config::load_and_validate;
use seqdag::design::Design;
use seqdag::errors::SeqdagError;
use seqdag::types::Assay;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn reserved_flag_in_options_returns_disallowed_option() {
    let file = config_file(
        r#"
[project]
name = "p"
assay = "ChIP"

[options.macs]
callpeak = "-f BAMPE -n custom"
"#,
    );

    match load_and_validate(file.path()) {
        Err(SeqdagError::DisallowedOption { key, flag }) => {
            assert_eq!(key, "macs.callpeak");
            assert_eq!(flag, "-n");
        }
        Err(e) => panic!("Expected DisallowedOption error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_option_key_returns_config_error() {
    let file = config_file(
        r#"
[project]
name = "p"
assay = "ATAC"

[options.macs]
bdgcmp = "--foo"
"#,
    );

    match load_and_validate(file.path()) {
        Err(SeqdagError::ConfigError(msg)) => {
            assert!(msg.contains("unknown option key"));
            assert!(msg.contains("bdgcmp"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn peaks_for_rna_returns_config_error() {
    let file = config_file(
        r#"
[project]
name = "p"
assay = "RNA"

[peaks]
call = true
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(SeqdagError::ConfigError(msg)) if msg.contains("[peaks].call")
    ));
}

#[test]
fn unknown_assay_is_a_toml_error() {
    let file = config_file(
        r#"
[project]
name = "p"
assay = "HiC"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(SeqdagError::TomlError(_))
    ));
}

#[test]
fn full_config_loads_with_defaults() {
    let file = config_file(
        r#"
[project]
name = "p"
assay = "ChIP"

[genome]
name = "mm10"
chromosome_sizes = "mm10.chrom.sizes"

[peaks]
call = true
methods = ["macs", "lanceotron"]

[hub]
create = true
email = "someone@example.org"

[resources.default]
threads = 4

[config]
jobs = 3
retries = 2
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.assay(), Assay::ChIP);
    assert_eq!(cfg.peak_callers().len(), 2);
    assert_eq!(cfg.config.jobs, 3);
    assert_eq!(cfg.config.retries, 2);
    assert_eq!(cfg.genome.name, "mm10");
}

#[test]
fn design_sheet_rejects_duplicate_pairs() {
    let sheet = "sample_name,ip,control\nrep1,CTCF,input\nrep1,CTCF,\n";
    match Design::from_reader(sheet.as_bytes(), Assay::ChIP) {
        Err(SeqdagError::DesignError(msg)) => assert!(msg.contains("duplicate")),
        other => panic!("Expected DesignError, got: {:?}", other),
    }
}

#[test]
fn design_lookup_of_unknown_pair_is_structured() {
    let sheet = "sample_name,ip\nrep1,CTCF\n";
    let design = Design::from_reader(sheet.as_bytes(), Assay::ChIP).unwrap();
    match design.lookup("rep2", "CTCF") {
        Err(SeqdagError::MissingDesignEntry { sample, ip }) => {
            assert_eq!(sample, "rep2");
            assert_eq!(ip, "CTCF");
        }
        other => panic!("Expected MissingDesignEntry, got: {:?}", other),
    }
}
