use std::collections::btree_map::{BTreeMap, Entry};

use clap::Args;

use crate::sh::{ShOptionsBuilder, StreamMode};

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Path to YAML config (defaults to `<workspace>/sweep.yaml`)
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Only run these entries (repeatable).
    ///
    /// Example: `xtask sweep -e canonical -e uneven`
    #[arg(short = 'e', long = "entry")]
    pub entries: Vec<String>,

    /// Build and run the driver with `--release`
    #[arg(long)]
    pub release: bool,

    /// Print commands and driver output as they run
    #[arg(long)]
    pub verbose: bool,
}

const DEFAULT_COMMAND: &str = "cargo run --quiet --package matmul-parallel {profile_flag} -- {args}";

#[derive(serde::Deserialize)]
struct SweepConfig {
    #[serde(default)]
    pre: Vec<String>,
    /// Driver command template; `{workspace}`, `{profile_flag}` and `{args}`
    /// are substituted.
    command: Option<String>,
    entries: Vec<SweepEntry>,
}

/// A scalar or a (possibly nested) list, so YAML aliases can expand cleanly.
#[derive(serde::Deserialize, Debug, Clone)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<OneOrMany<T>>),
}

impl<T: Clone> OneOrMany<T> {
    fn flatten(&self, out: &mut Vec<T>) {
        match self {
            OneOrMany::One(v) => out.push(v.clone()),
            OneOrMany::Many(vs) => {
                for v in vs {
                    v.flatten(out);
                }
            }
        }
    }

    fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::new();
        self.flatten(&mut out);
        out
    }
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SweepEntry {
    name: String,
    dim: usize,
    workers: OneOrMany<usize>,
    dispatch: Option<OneOrMany<String>>,
    partition: Option<OneOrMany<String>>,
    /// Extra driver flags passed to every run of this entry.
    #[serde(default)]
    args: Vec<String>,
    /// Expected driver exit code (the number of failed checks).
    #[serde(default)]
    expect_errors: i32,
}

fn load_config(path: &std::path::Path) -> Result<SweepConfig, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    Ok(serde_yaml::from_slice(&bytes)?)
}

#[derive(Debug, PartialEq)]
struct Run {
    entry: String,
    name: String,
    dim: usize,
    workers: usize,
    args: String,
    expect_errors: i32,
}

fn expand(entry: &SweepEntry) -> Vec<Run> {
    let dispatchers = entry
        .dispatch
        .as_ref()
        .map(OneOrMany::to_vec)
        .unwrap_or_else(|| vec!["threads".to_string()]);
    let partitions = entry
        .partition
        .as_ref()
        .map(OneOrMany::to_vec)
        .unwrap_or_else(|| vec!["remainder-last".to_string()]);

    let mut runs = Vec::new();
    for partition in &partitions {
        for dispatch in &dispatchers {
            for workers in entry.workers.to_vec() {
                let mut args = vec![
                    format!("--dispatch {dispatch}"),
                    format!("--partition {partition}"),
                ];
                args.extend(entry.args.iter().cloned());
                runs.push(Run {
                    entry: entry.name.clone(),
                    name: format!("{} [w={workers} {dispatch} {partition}]", entry.name),
                    dim: entry.dim,
                    workers,
                    args: args.join(" "),
                    expect_errors: entry.expect_errors,
                });
            }
        }
    }
    runs
}

fn render_template(template: &str, workspace: &std::path::Path, profile_flag: &str, args: &str) -> String {
    template
        .replace("{workspace}", &workspace.to_string_lossy())
        .replace("{profile_flag}", profile_flag)
        .replace("{args}", args)
}

/// The diagnostic corner table printed by the driver, one line per row.
fn parse_corner(stdout: &str) -> Option<Vec<String>> {
    let mut lines = stdout.lines().skip_while(|l| !l.starts_with("Sample results"));
    lines.next()?;
    Some(
        lines
            .take_while(|l| !l.starts_with("Checksum:"))
            .map(|l| l.trim_end().to_string())
            .collect(),
    )
}

pub fn run(args: SweepArgs) -> Result<(), Box<dyn std::error::Error>> {
    let workspace = crate::findup::workspace_root()?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| workspace.join("sweep.yaml"));
    let cfg = load_config(&config_path)?;
    let template = cfg.command.as_deref().unwrap_or(DEFAULT_COMMAND);
    let profile_flag = if args.release { "--release" } else { "" };

    let stderr = if args.verbose {
        StreamMode::Inherit
    } else {
        StreamMode::Pipe
    };

    for (i, cmd) in cfg.pre.iter().enumerate() {
        println!("[pre:{}] {}", i + 1, cmd);
        let opts = ShOptionsBuilder::default()
            .stderr(stderr.clone())
            .cwd(Some(workspace.clone()))
            .build()?;
        crate::sh!(options(opts), cmd)?;
    }

    let mut runs: Vec<Run> = Vec::new();
    for entry in &cfg.entries {
        if !args.entries.is_empty() && !args.entries.iter().any(|e| e == &entry.name) {
            continue;
        }
        runs.extend(expand(entry));
    }

    let mut failures: Vec<String> = Vec::new();
    // First corner seen per entry; every later run of that entry must match it.
    let mut corners: BTreeMap<String, (String, Vec<String>)> = BTreeMap::new();

    for (i, run) in runs.iter().enumerate() {
        println!("[{}/{}] {}", i + 1, runs.len(), run.name);
        let cmd = render_template(template, &workspace, profile_flag, &run.args);
        if args.verbose {
            println!("{cmd}");
        }

        // Dimension and worker count go through the driver's env fallbacks.
        let opts = ShOptionsBuilder::default()
            .stdout(StreamMode::Pipe)
            .stderr(stderr.clone())
            .cwd(Some(workspace.clone()))
            .env(("MATMUL_DIM".to_string(), run.dim.to_string()))
            .env(("MATMUL_WORKERS".to_string(), run.workers.to_string()))
            .allow_failure(true)
            .build()?;
        let out = crate::sh!(options(opts), &cmd)?;
        if args.verbose {
            print!("{}", out.stdout);
        }

        if out.code() != run.expect_errors {
            failures.push(format!(
                "{}: exit code {} (expected {})\n{}",
                run.name,
                out.code(),
                run.expect_errors,
                out.stderr
            ));
            continue;
        }

        let Some(corner) = parse_corner(&out.stdout) else {
            failures.push(format!("{}: no sample results in output", run.name));
            continue;
        };

        match corners.entry(run.entry.clone()) {
            Entry::Vacant(slot) => {
                slot.insert((run.name.clone(), corner));
            }
            Entry::Occupied(slot) => {
                let (first, expected) = slot.get();
                if expected != &corner {
                    failures.push(format!(
                        "{}: sample results differ from {}\n  got:      {:?}\n  expected: {:?}",
                        run.name, first, corner, expected
                    ));
                }
            }
        }
    }

    if failures.is_empty() {
        println!("[sweep] {} runs passed", runs.len());
        return Ok(());
    }

    for f in &failures {
        eprintln!("[sweep] FAILED {f}");
    }
    Err(format!("{} of {} runs failed", failures.len(), runs.len()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(entries: &str) -> SweepConfig {
        serde_yaml::from_str(entries).unwrap()
    }

    #[test]
    fn test_expand_cross_product() {
        let cfg = parse(
            r#"
entries:
  - name: canonical
    dim: 128
    workers: [1, 2, [4, 8]]
    dispatch: [threads, rayon]
"#,
        );
        let runs = expand(&cfg.entries[0]);
        assert_eq!(runs.len(), 8);
        assert_eq!(runs[0].workers, 1);
        assert_eq!(runs[3].workers, 8);
        assert_eq!(runs[4].args, "--dispatch rayon --partition remainder-last");
        assert_eq!(runs[7].name, "canonical [w=8 rayon remainder-last]");
        assert!(runs.iter().all(|r| r.dim == 128 && r.expect_errors == 0));
    }

    #[test]
    fn test_scalar_workers_and_extra_args() {
        let cfg = parse(
            r#"
command: "{workspace}/driver {args}"
entries:
  - name: full
    dim: 7
    workers: 3
    partition: balanced
    args: ["--verify full"]
"#,
        );
        let runs = expand(&cfg.entries[0]);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].args, "--dispatch threads --partition balanced --verify full");

        let cmd = render_template(
            cfg.command.as_deref().unwrap(),
            std::path::Path::new("/ws"),
            "",
            &runs[0].args,
        );
        assert_eq!(cmd, "/ws/driver --dispatch threads --partition balanced --verify full");
    }

    #[test]
    fn test_yaml_aliases_expand() {
        let cfg = parse(
            r#"
common_workers: &workers [1, 2, 4, 8]
entries:
  - name: a
    dim: 16
    workers: *workers
  - name: b
    dim: 9
    workers: [*workers, 16]
"#,
        );
        assert_eq!(cfg.entries[0].workers.to_vec(), [1, 2, 4, 8]);
        assert_eq!(cfg.entries[1].workers.to_vec(), [1, 2, 4, 8, 16]);
        assert_eq!(expand(&cfg.entries[1])[4].entry, "b");
    }

    #[test]
    fn test_unknown_entry_keys_are_rejected() {
        let res = serde_yaml::from_str::<SweepConfig>(
            "entries:\n  - name: x\n    dim: 4\n    worker: 2\n",
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_parse_corner() {
        let stdout = "\
Verifying results...
✓ C[0,0] = 2858 (correct)

Sample results (first 2x2 submatrix of C):
 2858  2516
 2874  1756
Checksum: 123

✓ Test PASSED
";
        assert_eq!(
            parse_corner(stdout).unwrap(),
            [" 2858  2516", " 2874  1756"]
        );
        assert!(parse_corner("no table here").is_none());
    }

    #[test]
    fn test_workspace_sweep_config_parses() {
        let root = crate::findup::workspace_root().unwrap();
        let cfg = load_config(&root.join("sweep.yaml")).unwrap();
        assert!(cfg.entries.iter().any(|e| e.name == "canonical"));
        let total: usize = cfg.entries.iter().map(|e| expand(e).len()).sum();
        assert!(total >= 12);
    }
}
