use std::{fs, io::BufRead, path::{Path, PathBuf}};

use anyhow::{bail, Context};
use itertools::Itertools;
use serde::{de::{Error, MapAccess, Visitor}, Deserialize, Deserializer, Serialize};

use crate::error::ErrorKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestOutput {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Text(String), // Strings and names by text, "-mark-" for marks, "*" for anything
    List(Vec<TestOutput>),
    Null,
}

/// Expected state after one line: the whole operand stack, bottom first,
/// or the error the line raises.
#[derive(Debug, Clone)]
pub struct EvaluationResult(Result<Vec<TestOutput>, ErrorKind>);

impl From<EvaluationResult> for Result<Vec<TestOutput>, ErrorKind> {
    fn from(value: EvaluationResult) -> Self {
        value.0
    }
}

impl<'de> Deserialize<'de> for EvaluationResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EntryVisitor)
    }
}

struct EntryVisitor;

impl<'de> Visitor<'de> for EntryVisitor {
    type Value = EvaluationResult;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "an object with 'ok' and either 'output' (a stack) or 'type' (an error name)")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut ok: Option<bool> = None;
        let mut output: Option<Vec<TestOutput>> = None;
        let mut error: Option<String> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "ok" if ok.is_none() => ok = Some(map.next_value()?),
                "output" if output.is_none() => output = Some(map.next_value()?),
                "type" if error.is_none() => error = Some(map.next_value()?),
                other => return Err(A::Error::custom(format!("unexpected or repeated key '{}'", other))),
            }
        }

        match (ok, output, error) {
            (Some(true), Some(stack), None) => Ok(EvaluationResult(Ok(stack))),
            (Some(false), None, Some(name)) => ErrorKind::from_name(&name)
                .map(|kind| EvaluationResult(Err(kind)))
                .ok_or_else(|| A::Error::custom(format!("unknown error name '{}'", name))),
            (None, ..) => Err(A::Error::missing_field("ok")),
            _ => Err(A::Error::custom("'ok' disagrees with the keys present")),
        }
    }
}

fn fixture_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(name)
}

fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let source = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(source.lines().collect::<Result<_, _>>()?)
}

fn read_expectations(path: &Path) -> anyhow::Result<Vec<EvaluationResult>> {
    let source = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&source).with_context(|| format!("parsing {}", path.display()))
}

/// Lines of `test_inputs/<n>.ps` paired with entries of `test_outputs/<n>.json`.
/// Every line of one testcase runs in the same interpreter.
pub fn load_test_pair(testcase: usize) -> anyhow::Result<Vec<(String, EvaluationResult)>> {
    let input = read_lines(&fixture_dir("test_inputs").join(format!("{}.ps", testcase)))?;
    let output = read_expectations(&fixture_dir("test_outputs").join(format!("{}.json", testcase)))?;

    if input.len() != output.len() {
        bail!("testcase {} has {} lines but {} expectations", testcase, input.len(), output.len());
    }
    Ok(input.into_iter().zip(output).collect_vec())
}

/// Numbers of every `test_inputs/<n>.ps`, ascending.
pub fn all_testcases() -> anyhow::Result<Vec<usize>> {
    let mut testcases = Vec::new();
    for entry in fs::read_dir(fixture_dir("test_inputs"))? {
        let path = entry?.path();
        if path.extension().is_some_and(|extension| extension == "ps") {
            if let Some(number) = path.file_stem().and_then(|stem| stem.to_str()?.parse().ok()) {
                testcases.push(number);
            }
        }
    }
    testcases.sort_unstable();
    Ok(testcases)
}
