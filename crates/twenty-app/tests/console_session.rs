use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn twentyq() -> Command {
    let mut cmd = Command::cargo_bin("twentyq").expect("binary built");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn guesses_the_cow_from_piped_answers() {
    twentyq()
        .arg("--kb")
        .arg(fixture("three_animals.json"))
        .write_stdin("y\nn\ny\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Think of an animal, and I will try to guess it.",
        ))
        .stdout(predicate::str::contains("hasFur? (y/n/m)"))
        .stdout(predicate::str::contains("Is it a cow? (y/n)"))
        .stdout(predicate::str::contains("Yay! I guessed it right"));
}

#[test]
fn unparseable_answers_are_reprompted() {
    twentyq()
        .arg("--kb")
        .arg(fixture("three_animals.json"))
        .write_stdin("what\ny\nn\ny\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Please answer 'y', 'n', or 'm' (maybe).",
        ))
        .stdout(predicate::str::contains("Is it a cow? (y/n)"));
}

#[test]
fn missing_knowledge_base_fails_before_asking() {
    twentyq()
        .arg("--kb")
        .arg(fixture("does_not_exist.json"))
        .write_stdin("y\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("(y/n/m)").not())
        .stderr(predicate::str::contains("loading knowledge base"));
}

#[test]
fn random_policy_only_guesses() {
    twentyq()
        .args(["--policy", "random", "--seed", "3", "--kb"])
        .arg(fixture("three_animals.json"))
        .write_stdin("n\nn\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("(y/n/m)").not())
        .stdout(predicate::str::contains(
            "I couldn't guess your animal from my knowledge base.",
        ));
}

#[test]
fn unknown_policy_is_rejected() {
    twentyq()
        .args(["--policy", "oracle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown policy 'oracle'"));
}

#[test]
fn bundled_catalog_opens_with_a_question() {
    twentyq()
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question #1"))
        .stdout(predicate::str::contains("(y/n/m)"))
        .stdout(predicate::str::contains("No more answers"));
}

#[test]
fn report_records_the_transcript() {
    let dir = tempfile::tempdir().expect("temp dir");
    let report = dir.path().join("game.json");

    twentyq()
        .arg("--kb")
        .arg(fixture("three_animals.json"))
        .arg("--report")
        .arg(&report)
        .write_stdin("y\nn\ny\ny\n")
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).expect("report written"))
            .expect("report is JSON");
    assert_eq!(json["outcome"], "solved");
    assert_eq!(json["policy"], "bayesian");
    assert_eq!(json["questions"], 3);
    assert_eq!(json["guesses"], 1);
    let transcript = json["transcript"].as_array().expect("transcript array");
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript[0]["attribute"], "hasFur");
    assert_eq!(transcript[3]["entity"], "cow");
    assert_eq!(transcript[3]["correct"], true);
}
