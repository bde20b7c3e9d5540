use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use templar::{DataContext, ErrorCode, Templar, TemplarConfig};

/// Optional `state.json` next to the template.
#[derive(Debug, Deserialize, Default)]
struct StateFile {
    #[serde(default)]
    max_loop_iterations: usize,
}

#[derive(Debug, Deserialize)]
struct ExpectedError {
    code: ErrorCode,
    #[serde(default)]
    message_contains: Option<String>,
}

/// Render `template.tpl` against `context.json` and compare with
/// `expected.txt`, or with `expected_error.json` for failing cases.
///
/// Every case is rendered inline, then twice through the artifact cache
/// (cold, then warm) from a fresh views directory. All three must agree.
pub fn run_case(case_dir: &Path) {
    let template = read_to_string(case_dir.join("template.tpl"));
    let context_json: serde_json::Value = if case_dir.join("context.json").exists() {
        read_json(case_dir.join("context.json"))
    } else {
        serde_json::json!({})
    };
    let state: StateFile = if case_dir.join("state.json").exists() {
        read_json(case_dir.join("state.json"))
    } else {
        StateFile::default()
    };

    let workdir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = TemplarConfig::rooted_at(workdir.path());
    config.max_loop_iterations = state.max_loop_iterations;
    fs::create_dir_all(&config.view_path).expect("Failed to create views dir");
    fs::write(config.view_path.join("template.tpl"), &template).expect("Failed to write view");

    let templar = Templar::new(config).expect("Failed to build engine");
    let context = DataContext::from_json(context_json)
        .unwrap_or_else(|e| panic!("Invalid context.json in {}: {}", case_dir.display(), e));

    let inline = templar.render_from_text(&template, &context);
    let cold = templar.render("template", &context);
    let warm = templar.render("template", &context);

    let expected_error = case_dir.join("expected_error.json");
    if expected_error.exists() {
        let expected: ExpectedError = read_json(expected_error);
        for (label, result) in [("inline", inline), ("cold", cold), ("warm", warm)] {
            match result {
                Ok(out) => panic!(
                    "[{}] {}: expected {:?}, rendered {:?}",
                    label,
                    case_dir.display(),
                    expected.code,
                    out
                ),
                Err(e) => {
                    assert_eq!(e.code(), expected.code, "[{}] {}: {}", label, case_dir.display(), e);
                    if let Some(fragment) = &expected.message_contains {
                        assert!(
                            e.to_string().contains(fragment.as_str()),
                            "[{}] {}: '{}' does not contain '{}'",
                            label,
                            case_dir.display(),
                            e,
                            fragment
                        );
                    }
                }
            }
        }
        return;
    }

    let expected = read_to_string(case_dir.join("expected.txt"));
    for (label, result) in [("inline", inline), ("cold", cold), ("warm", warm)] {
        let out = result.unwrap_or_else(|e| panic!("[{}] {}: {}", label, case_dir.display(), e));
        assert_eq!(
            out.trim_end(),
            expected.trim_end(),
            "[{}] output mismatch in {}",
            label,
            case_dir.display()
        );
    }
    let stats = templar.cache().stats();
    assert_eq!(stats.misses, 1, "{}: expected one compilation", case_dir.display());
    assert_eq!(stats.hits, 1, "{}: expected one cache hit", case_dir.display());
}

fn read_to_string(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path.as_ref()).unwrap_or_else(|e| {
        panic!("Failed to read {}: {}", path.as_ref().display(), e)
    })
}

fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> T {
    serde_json::from_str(&read_to_string(path.as_ref())).unwrap_or_else(|e| {
        panic!("Failed to parse {}: {}", path.as_ref().display(), e)
    })
}
