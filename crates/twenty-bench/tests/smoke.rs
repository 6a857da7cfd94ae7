use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use tempfile::tempdir;
use twenty_bench::config::BenchmarkConfig;
use twenty_bench::runner::{RunSummary, SimulationRunner};

const ZOO: &str = r#"{
    "bat":     { "canFly": true,  "hasFur": true,  "isNocturnal": true,  "laysEggs": false },
    "cat":     { "canFly": false, "hasFur": true,  "isDomestic": true,   "isPredator": true },
    "cow":     { "canFly": false, "hasFur": true,  "isDomestic": true,   "isPredator": false },
    "eagle":   { "canFly": true,  "hasFur": false, "isPredator": true,   "laysEggs": true },
    "frog":    { "canFly": false, "hasFur": false, "livesInWater": true, "laysEggs": true },
    "owl":     { "canFly": true,  "hasFur": false, "isNocturnal": true,  "isPredator": true },
    "shark":   { "canFly": false, "hasFur": false, "livesInWater": true, "isPredator": true },
    "sheep":   { "canFly": false, "hasFur": true,  "isDomestic": true,   "isPredator": false, "laysEggs": false }
}"#;

fn load_config(output_dir: &Path) -> BenchmarkConfig {
    let kb_path = output_dir.join("zoo.json");
    fs::write(&kb_path, ZOO).expect("write knowledge base");

    let yaml = format!(
        r#"
run_id: "test_smoke"
knowledge_base: "{kb}"
trials:
  seed: 4242
  count: 40
  noise:
    maybe_rate: 0.1
    error_rate: 0.05
agents:
  - name: "random"
    kind: "random"
  - name: "bayes"
    kind: "bayesian"
  - name: "bayes_narrow"
    kind: "bayesian"
    params:
      shortlist_min: 2
      collapse_mass: 0.9
outputs:
  jsonl: "{jsonl}"
  summary_md: "{summary}"
  plots_dir: "{plots}"
metrics:
  baseline: "random"
logging:
  enable_structured: false
"#,
        kb = kb_path.display(),
        jsonl = output_dir.join("trials.jsonl").display(),
        summary = output_dir.join("summary.md").display(),
        plots = output_dir.join("plots").display()
    );

    let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    cfg.validate().expect("config validates");
    cfg
}

fn run_once(dir: &Path) -> RunSummary {
    let config = load_config(dir);
    let outputs = config.resolved_outputs();
    let runner = SimulationRunner::new(config, outputs).expect("runner created");
    runner.run().expect("simulation completes")
}

/// Hash of the JSONL rows with wall-clock timings zeroed out.
fn normalized_digest(path: &Path) -> String {
    let jsonl = fs::read_to_string(path).expect("jsonl readable");
    let mut normalized = String::new();
    for line in jsonl.lines() {
        let mut value: serde_json::Value = serde_json::from_str(line).expect("row decodes to JSON");
        if let Some(obj) = value.as_object_mut()
            && let Some(elapsed) = obj.get_mut("elapsed_ms")
        {
            *elapsed = serde_json::Value::from(0.0);
        }
        normalized.push_str(&serde_json::to_string(&value).expect("re-serialize normalized row"));
        normalized.push('\n');
    }

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

#[test]
fn simulation_smoke_test_is_reproducible() {
    let first_dir = tempdir().expect("temp dir");
    let second_dir = tempdir().expect("temp dir");

    let first = run_once(first_dir.path());
    let second = run_once(second_dir.path());

    assert_eq!(first.trials_played, 40);
    assert_eq!(first.agents, 3);
    assert_eq!(first.rows_written, 120);

    // Paths differ between the two runs but rows must not.
    assert_eq!(
        normalized_digest(&first.jsonl_path),
        normalized_digest(&second.jsonl_path),
        "same seed produced different trial rows"
    );

    assert!(first.summary_path.exists(), "summary markdown missing");
    if let Some(plot_path) = first.plot_path {
        assert!(plot_path.exists(), "plot path reported but missing on disk");
    }
    assert!(first.telemetry_path.is_none());
}

#[test]
fn rows_reflect_each_agent_strategy() {
    let dir = tempdir().expect("temp dir");
    let summary = run_once(dir.path());

    let jsonl = fs::read_to_string(&summary.jsonl_path).expect("jsonl readable");
    let mut random_rows = 0;
    for line in jsonl.lines() {
        let row: serde_json::Value = serde_json::from_str(line).expect("row decodes");
        assert!(row["turns"].as_u64().expect("turns") <= 21);
        assert_eq!(row["budget"].as_u64(), Some(20));

        let questions = row["questions"].as_u64().expect("questions");
        match row["agent"].as_str().expect("agent field") {
            // Eight entities always fit in a 20-turn budget of pure guesses.
            "random" => {
                random_rows += 1;
                assert_eq!(questions, 0);
                assert_eq!(row["outcome"], "solved");
            }
            _ => assert!(questions >= 1, "bayesian agents open with a question"),
        }
    }
    assert_eq!(random_rows, 40);

    let markdown = fs::read_to_string(&summary.summary_path).expect("summary readable");
    assert!(markdown.contains("| random | random | 40 | 100.0% |"));
    assert!(markdown.contains("| bayes | bayesian | 40 |"));
}

#[test]
fn missing_knowledge_base_fails_to_build_runner() {
    let dir = tempdir().expect("temp dir");
    let mut config = load_config(dir.path());
    config.knowledge_base = dir.path().join("absent.json");
    let outputs = config.resolved_outputs();
    assert!(SimulationRunner::new(config, outputs).is_err());
}
