use std::cell::RefCell;
use std::env;
use std::fs;
use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use approx::assert_relative_eq;
use assert_matches::assert_matches;
use rstest::*;
use tempfile::tempdir;

use crate::errors::{ApplicationError, ApplicationNotFoundError, DataError, MissingParameterError};
use crate::raxml::result::parse_log;
use crate::raxml::{
    escape_double_quoted, find_executable, output_file_name, parse_version, CommandRunner,
    InputData, ParamMap, Raxml, ResultKind, RunOutput, ShellRunner,
};
use crate::Result;

pub(crate) const PHYLIP_RNA: &str = " 7 50
Species001   UGCAUGUCAG UAUAGCUUUA GUGAAACUGC GAAUGGCUCA UUAAAUCAGU
Species002   UGCAUGUCAG UAUAGCUUUA GUGAAACUGC GAAUGGCUNN UUAAAUCAGU
Species003   UGCAUGUCAG UAUAGCAUUA GUGAAACUGC GAAUGGCUCA UUAAAUCAGU
Species004   UCCAUGUCAG UAUAACUUUG GUGAAACUGC GAAUGGCUCA UUAAAUCAGG
Species005   NNNNNNNNNN UAUAUCUUAU GUGAAACUUC GAAUGCCUCA UUAAAUCAGU
Species006   UGCAUGUCAG UAUAGCUUUG GUGAAACUGC GAAUGGCUCA UUAAAUCAGU
Species007   UGCAUGUCAG UAUAACUUUG GUGAAACUGC GAAUGGCUCA UUAAAUCAGU
";

const DEFAULT_FLAGS: &str = "-A S16 -B 0.03 -O 3600.0 -K GTR -e 0.1 -f d -c 50 -# 1";

const VERSION_OUTPUT: &str = "\n\nThis is RAxML version 7.2.6 released by Alexandros Stamatakis in February 2010.\n\
    With greatly appreciated code contributions by:\n";

/// Stands in for raxmlHPC: records every command, remembers the alignment it was given and
/// writes the configured output files into the run's output directory.
#[derive(Clone)]
pub(crate) struct FakeRunner {
    pub(crate) commands: Rc<RefCell<Vec<String>>>,
    pub(crate) inputs: Rc<RefCell<Vec<String>>>,
    outputs: Vec<(&'static str, String)>,
    exit_code: Option<i32>,
    installed: bool,
    stdout: String,
    stderr: String,
}

impl FakeRunner {
    pub(crate) fn new() -> Self {
        Self {
            commands: Rc::new(RefCell::new(Vec::new())),
            inputs: Rc::new(RefCell::new(Vec::new())),
            outputs: Vec::new(),
            exit_code: Some(0),
            installed: true,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub(crate) fn writes(mut self, prefix: &'static str, content: &str) -> Self {
        self.outputs.push((prefix, content.to_string()));
        self
    }

    pub(crate) fn standard_run() -> Self {
        Self::new()
            .writes("RAxML_info", "info")
            .writes(
                "RAxML_result",
                "((seq0000001:0.1,seq0000002:0.2):0.05,seq0000003:0.3,seq0000004:0.4);\n",
            )
            .writes(
                "RAxML_parsimonyTree",
                "((seq0000001,seq0000002),seq0000003,seq0000004);\n",
            )
            .writes("RAxML_log", "0.5 -1200.25\n1.25 -1100.5\n")
    }

    fn fails(mut self, exit_code: i32, stderr: &str) -> Self {
        self.exit_code = Some(exit_code);
        self.stderr = stderr.to_string();
        self
    }

    fn not_installed(mut self) -> Self {
        self.installed = false;
        self
    }

    fn prints(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    pub(crate) fn command_count(&self) -> usize {
        self.commands.borrow().len()
    }

    pub(crate) fn last_command(&self) -> String {
        self.commands.borrow().last().cloned().unwrap_or_default()
    }
}

/// Value following `flag` in a rendered command, quotes removed.
pub(crate) fn arg_value(command: &str, flag: &str) -> Option<String> {
    let args = command.split_once("; ").map(|(_, args)| args)?;
    let mut tokens = args.split_whitespace();
    tokens.position(|t| t == flag)?;
    tokens.next().map(|v| v.trim_matches('"').to_string())
}

fn cd_dir(command: &str) -> PathBuf {
    let dir = command
        .strip_prefix("cd \"")
        .and_then(|rest| rest.split_once("/\";"))
        .map(|(dir, _)| dir)
        .unwrap_or(".");
    PathBuf::from(dir)
}

impl CommandRunner for FakeRunner {
    fn run(&self, command: &str, _: bool, _: bool) -> Result<RunOutput> {
        self.commands.borrow_mut().push(command.to_string());
        if command.ends_with(" -v") {
            return Ok(RunOutput {
                exit_code: Some(0),
                stdout: self.stdout.clone(),
                stderr: String::new(),
            });
        }
        if let Some(input) = command
            .split_once(" -s ")
            .map(|(_, rest)| rest.split(" -# ").next().unwrap_or(rest))
        {
            let input = input.trim().trim_matches('"');
            if let Ok(content) = fs::read_to_string(input) {
                self.inputs.borrow_mut().push(content);
            }
        }
        if self.exit_code == Some(0) {
            let dir = arg_value(command, "-w")
                .map(PathBuf::from)
                .unwrap_or_else(|| cd_dir(command));
            let name = arg_value(command, "-n").unwrap_or_default();
            for (prefix, content) in &self.outputs {
                fs::write(output_file_name(&dir, prefix, &name), content)?;
            }
        }
        Ok(RunOutput {
            exit_code: self.exit_code,
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        })
    }

    fn application_exists(&self, _: &str) -> bool {
        self.installed
    }
}

fn fake_raxml(dir: &Path, runner: &FakeRunner) -> Raxml {
    Raxml::with_working_dir(dir).runner(Box::new(runner.clone()))
}

fn required_params(input: &Path, name: &str) -> ParamMap {
    ParamMap::from([
        ("-s".to_string(), input.display().to_string()),
        ("-m".to_string(), "GTRCAT".to_string()),
        ("-n".to_string(), name.to_string()),
    ])
}

#[test]
fn base_command_defaults() {
    let cwd = env::current_dir().unwrap();
    let mut raxml = Raxml::new();
    assert_eq!(
        raxml.base_command(),
        format!("cd \"{}/\"; raxmlHPC {DEFAULT_FLAGS}", cwd.display())
    );
    raxml.parameters.on("-s", "seq.nexus").unwrap();
    assert_eq!(
        raxml.base_command(),
        format!(
            "cd \"{}/\"; raxmlHPC -A S16 -B 0.03 -O 3600.0 -K GTR -e 0.1 -f d -c 50 -s seq.nexus -# 1",
            cwd.display()
        )
    );
}

#[test]
fn base_command_recomputed() {
    let mut raxml = Raxml::with_working_dir("/tmp/");
    assert_eq!(raxml.base_command(), format!("cd \"/tmp/\"; raxmlHPC {DEFAULT_FLAGS}"));
    raxml.set_working_dir("/var/data");
    assert!(raxml.base_command().starts_with("cd \"/var/data/\"; raxmlHPC -A"));
    assert_eq!(raxml.to_string(), raxml.base_command());
}

#[rstest]
#[case::model("-m", "GTRCAT", "-A S16 -B 0.03 -O 3600.0 -K GTR -e 0.1 -f d -m GTRCAT -c 50 -# 1")]
#[case::override_default("-f", "v", "-A S16 -B 0.03 -O 3600.0 -K GTR -e 0.1 -f v -c 50 -# 1")]
#[case::flag("-k", "true", "-A S16 -B 0.03 -O 3600.0 -K GTR -e 0.1 -f d -k -c 50 -# 1")]
#[case::working_dir("-w", "/tmp/", "-A S16 -B 0.03 -O 3600.0 -K GTR -e 0.1 -f d -w /tmp/ -c 50 -# 1")]
#[case::runs("-#", "10", "-A S16 -B 0.03 -O 3600.0 -K GTR -e 0.1 -f d -c 50 -# 10")]
fn setting_one_parameter(#[case] flag: &str, #[case] value: &str, #[case] expected: &str) {
    let mut raxml = Raxml::with_working_dir("/tmp");
    raxml.parameters.on(flag, value).unwrap();
    assert_eq!(
        raxml.base_command(),
        format!("cd \"/tmp/\"; raxmlHPC {expected}")
    );
}

#[test]
fn switching_parameters_off() {
    let mut raxml = Raxml::with_working_dir("/tmp");
    raxml.parameters.off("-A").unwrap();
    raxml.parameters.off("-#").unwrap();
    assert_eq!(
        raxml.base_command(),
        "cd \"/tmp/\"; raxmlHPC -B 0.03 -O 3600.0 -K GTR -e 0.1 -f d -c 50"
    );
    assert!(raxml.parameters.get("-A").unwrap().is_off());
    assert_eq!(raxml.parameters.value("-A"), None);
}

#[test]
fn flag_parameters_from_map() {
    let params = ParamMap::from([
        ("-k".to_string(), "true".to_string()),
        ("-d".to_string(), "false".to_string()),
        ("-p".to_string(), "12345".to_string()),
    ]);
    let raxml = Raxml::with_working_dir("/tmp").params(&params).unwrap();
    assert!(raxml.parameters.is_on("-k"));
    assert!(!raxml.parameters.is_on("-d"));
    assert_eq!(raxml.parameters.value("-k"), None);
    assert_eq!(raxml.parameters.value("-p"), Some("12345"));
}

#[test]
fn unknown_parameter() {
    let mut raxml = Raxml::with_working_dir("/tmp");
    let res = raxml.parameters.on("-Q", "1");
    assert!(res.is_err());
    assert!(res.unwrap_err().downcast_ref::<DataError>().is_some());

    let params = ParamMap::from([("--threads".to_string(), "4".to_string())]);
    assert!(Raxml::with_working_dir("/tmp").params(&params).is_err());
    assert!(!raxml.parameters.is_on("-Q"));
}

#[test]
fn missing_required_parameters() {
    let dir = tempdir().unwrap();
    let runner = FakeRunner::standard_run().fails(255, "error");
    let mut raxml = fake_raxml(dir.path(), &runner)
        .suppress_stdout(true)
        .suppress_stderr(true);

    let err = raxml.run(None).unwrap_err();
    assert_matches!(err.downcast_ref::<MissingParameterError>(), Some(_));
    assert!(err.to_string().contains("-s"));

    raxml.parameters.on("-n", "test_name").unwrap();
    let err = raxml.run(None).unwrap_err();
    assert!(err.downcast_ref::<MissingParameterError>().is_some());

    raxml.parameters.on("-m", "GTRCAT").unwrap();
    let err = raxml.run(None).unwrap_err();
    assert!(err.downcast_ref::<MissingParameterError>().is_some());
    assert_eq!(runner.command_count(), 0);

    raxml.parameters.on("-s", dir.path().join("raxml_test1.txt").display()).unwrap();
    let err = raxml.run(None).unwrap_err();
    assert!(err.downcast_ref::<ApplicationError>().is_some());
    assert_eq!(runner.command_count(), 1);
}

#[test]
fn model_and_name_required_with_input() {
    let dir = tempdir().unwrap();
    let runner = FakeRunner::standard_run();
    let mut raxml = fake_raxml(dir.path(), &runner);
    raxml.parameters.on("-n", "name").unwrap();
    let err = raxml
        .run(Some(InputData::Phylip(PHYLIP_RNA.to_string())))
        .unwrap_err();
    assert!(err.downcast_ref::<MissingParameterError>().is_some());
    assert!(err.to_string().contains("-m"));
    assert_eq!(runner.command_count(), 0);
}

#[test]
fn application_not_found() {
    let dir = tempdir().unwrap();
    let runner = FakeRunner::standard_run().not_installed();
    let input = dir.path().join("input.phy");
    let raxml = fake_raxml(dir.path(), &runner)
        .params(&required_params(&input, "test_me"))
        .unwrap();
    let err = raxml.run(None).unwrap_err();
    assert!(err.downcast_ref::<ApplicationNotFoundError>().is_some());
    assert_eq!(runner.command_count(), 0);
}

#[test]
fn application_error_carries_output() {
    let dir = tempdir().unwrap();
    let runner = FakeRunner::standard_run().fails(255, "Cannot open input file");
    let input = dir.path().join("missing.phy");
    let raxml = fake_raxml(dir.path(), &runner)
        .params(&required_params(&input, "test_me"))
        .unwrap();
    let err = raxml.run(None).unwrap_err();
    let app_err = err.downcast_ref::<ApplicationError>().unwrap();
    assert_eq!(app_err.exit_code, Some(255));
    assert_eq!(app_err.stderr, "Cannot open input file");
    assert!(err.to_string().contains("exit code 255"));
}

#[test]
fn missing_result_file_is_an_error() {
    let dir = tempdir().unwrap();
    let runner = FakeRunner::new().writes("RAxML_info", "info");
    let input = dir.path().join("input.phy");
    let raxml = fake_raxml(dir.path(), &runner)
        .params(&required_params(&input, "test_me"))
        .unwrap();
    let err = raxml.run(None).unwrap_err();
    assert!(err.downcast_ref::<ApplicationError>().is_some());
    assert!(err.to_string().contains("RAxML_result.test_me"));
}

#[test]
fn run_from_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("raxml_test1.txt");
    fs::write(&input, PHYLIP_RNA).unwrap();
    let runner = FakeRunner::standard_run();
    let raxml = fake_raxml(dir.path(), &runner)
        .params(&required_params(&input, "test_me"))
        .unwrap();

    let result = raxml.run(None).unwrap();
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(
        result.kinds().copied().collect::<Vec<_>>(),
        [
            ResultKind::Info,
            ResultKind::Log,
            ResultKind::ParsimonyTree,
            ResultKind::Result
        ]
    );
    assert_eq!(
        result.path(ResultKind::Result).unwrap(),
        dir.path().join("RAxML_result.test_me")
    );
    assert_eq!(result.tree(ResultKind::Result).unwrap().tips().len(), 4);
    assert!(result.path(ResultKind::BestTree).is_none());
    assert!(result.open(ResultKind::BestTree).is_err());
    assert_eq!(runner.inputs.borrow().as_slice(), [PHYLIP_RNA]);

    let paths: Vec<PathBuf> = result
        .kinds()
        .filter_map(|&k| result.path(k).map(Path::to_path_buf))
        .collect();
    result.clean_up().unwrap();
    assert!(paths.iter().all(|p| !p.exists()));
    assert!(input.exists());
}

#[test]
fn result_handles() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("raxml_test1.txt");
    fs::write(&input, PHYLIP_RNA).unwrap();
    let runner = FakeRunner::standard_run();
    let raxml = fake_raxml(dir.path(), &runner)
        .params(&required_params(&input, "handles"))
        .unwrap();
    let result = raxml.run(None).unwrap();

    let mut content = String::new();
    result
        .open(ResultKind::Result)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(
        content,
        "((seq0000001:0.1,seq0000002:0.2):0.05,seq0000003:0.3,seq0000004:0.4);\n"
    );
    assert_eq!(content, result.read_to_string(ResultKind::Result).unwrap());

    let log_lines: Vec<String> = result
        .open(ResultKind::Log)
        .unwrap()
        .lines()
        .collect::<std::io::Result<_>>()
        .unwrap();
    assert_eq!(log_lines, ["0.5 -1200.25", "1.25 -1100.5"]);
    result.clean_up().unwrap();
}

#[test]
fn run_with_separate_output_dir() {
    let work_dir = tempdir().unwrap();
    let out_dir = tempdir().unwrap();
    let input = work_dir.path().join("raxml_test1.txt");
    fs::write(&input, PHYLIP_RNA).unwrap();
    let runner = FakeRunner::standard_run();
    let mut raxml = fake_raxml(work_dir.path(), &runner)
        .params(&required_params(Path::new("raxml_test1.txt"), "test_me2"))
        .unwrap();
    raxml
        .parameters
        .on("-w", format!("{}/", out_dir.path().display()))
        .unwrap();
    assert_eq!(raxml.output_dir(), PathBuf::from(format!("{}/", out_dir.path().display())));

    let result = raxml.run(None).unwrap();
    assert!(result.path(ResultKind::Info).unwrap().starts_with(out_dir.path()));
    assert!(!work_dir.path().join("RAxML_info.test_me2").exists());
    result.clean_up().unwrap();
}

#[test]
fn run_with_spaces_in_path() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("raxml test1.txt");
    fs::write(&input, PHYLIP_RNA).unwrap();
    let runner = FakeRunner::standard_run();
    let mut raxml = fake_raxml(dir.path(), &runner);
    raxml.parameters.on("-m", "GTRCAT").unwrap();
    raxml.parameters.on("-n", "test_me3").unwrap();

    let result = raxml.run(Some(InputData::Path(input.clone()))).unwrap();
    assert!(runner
        .last_command()
        .contains(&format!("-s \"{}\"", input.display())));
    assert_eq!(runner.inputs.borrow().len(), 1);
    assert!(!raxml.parameters.is_on("-s"));
    result.clean_up().unwrap();
}

#[test]
fn run_with_phylip_text() {
    let dir = tempdir().unwrap();
    let runner = FakeRunner::standard_run();
    let mut raxml = fake_raxml(dir.path(), &runner);
    raxml.parameters.on("-m", "GTRCAT").unwrap();
    raxml.parameters.on("-n", "phylip_text").unwrap();

    let result = raxml
        .run(Some(InputData::Phylip(PHYLIP_RNA.to_string())))
        .unwrap();
    assert_eq!(runner.inputs.borrow().as_slice(), [PHYLIP_RNA]);
    let input = arg_value(&runner.last_command(), "-s").unwrap();
    assert!(input.starts_with(&env::temp_dir().display().to_string()));
    assert!(!Path::new(&input).exists());
    result.clean_up().unwrap();
}

#[test]
fn tree_insertion_outputs() {
    let dir = tempdir().unwrap();
    let runner = FakeRunner::new()
        .writes("RAxML_info", "info")
        .writes("RAxML_labelledTree", "((A,B),C,QUERY___D___1);")
        .writes("RAxML_classification", "D I1 1 0.01")
        .writes("RAxML_portableTree", "{}");
    let mut raxml = fake_raxml(dir.path(), &runner);
    raxml.parameters.on("-f", "v").unwrap();
    raxml.parameters.on("-m", "GTRGAMMA").unwrap();
    raxml.parameters.on("-n", "insert").unwrap();
    raxml.parameters.on("-s", "aln.phy").unwrap();
    fs::write(dir.path().join("RAxML_checkpoint.insert.0"), "c0").unwrap();
    fs::write(dir.path().join("RAxML_checkpoint.insert.2"), "c2").unwrap();

    let result = raxml.run(None).unwrap();
    assert_eq!(
        result.tree(ResultKind::Result).unwrap().leaf_ids(),
        ["A", "B", "C", "QUERY___D___1"]
    );
    assert_eq!(
        result.path(ResultKind::Json).unwrap(),
        dir.path().join("RAxML_portableTree.insert.jplace")
    );
    assert!(result.path(ResultKind::Classification).is_some());
    assert!(result.path(ResultKind::Entropy).is_none());
    assert!(result.path(ResultKind::Checkpoint(0)).is_some());
    assert!(result.path(ResultKind::Checkpoint(2)).is_some());
    assert!(result.path(ResultKind::Log).is_none());
    result.clean_up().unwrap();
    assert!(!dir.path().join("RAxML_checkpoint.insert.2").exists());
}

#[test]
fn bootstrap_outputs() {
    let dir = tempdir().unwrap();
    let runner = FakeRunner::new()
        .writes("RAxML_info", "info")
        .writes("RAxML_bootstrap", "(A,B,C);\n(A,C,B);\n");
    let mut raxml = fake_raxml(dir.path(), &runner);
    raxml.parameters.on("-k", true).unwrap();
    raxml.parameters.on("-m", "GTRCAT").unwrap();
    raxml.parameters.on("-n", "boot").unwrap();
    raxml.parameters.on("-s", "aln.phy").unwrap();

    let result = raxml.run(None).unwrap();
    assert_eq!(result.trees(ResultKind::Bootstrap).unwrap().len(), 2);
    assert_eq!(result.tree(ResultKind::Bootstrap).unwrap().leaf_ids(), ["A", "B", "C"]);
    assert!(result.path(ResultKind::Result).is_none());
    result.clean_up().unwrap();
}

#[test]
fn log_entries() {
    let dir = tempdir().unwrap();
    let runner = FakeRunner::standard_run();
    let input = dir.path().join("input.phy");
    let raxml = fake_raxml(dir.path(), &runner)
        .params(&required_params(&input, "log"))
        .unwrap();
    let result = raxml.run(None).unwrap();
    let entries = result.log_entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_relative_eq!(entries[1].0, 1.25);
    assert_relative_eq!(entries[1].1, -1100.5);
    result.clean_up().unwrap();
}

#[rstest]
#[case::extra_column("1.0 -20.0 3\n")]
#[case::not_a_number("1.0 abc\n")]
fn malformed_log(#[case] content: &str) {
    let res = parse_log(content);
    assert!(res.is_err());
    assert!(res.unwrap_err().downcast_ref::<DataError>().is_some());
}

#[test]
fn version_parsing() {
    assert_eq!(parse_version(VERSION_OUTPUT).unwrap(), (7, 2, 6));
    assert!(parse_version("raxmlHPC: command not found").is_err());
    assert!(parse_version("This is RAxML version seven").is_err());
}

#[test]
fn version_check() {
    let dir = tempdir().unwrap();
    let runner = FakeRunner::new().prints(VERSION_OUTPUT);
    let raxml = fake_raxml(dir.path(), &runner);
    assert_eq!(raxml.version().unwrap(), (7, 2, 6));
    assert!(raxml.check_version().is_ok());
    assert_eq!(runner.last_command(), "raxmlHPC -v");

    let runner = FakeRunner::new().prints(&VERSION_OUTPUT.replace("7.2.6", "7.2.8"));
    let raxml = fake_raxml(dir.path(), &runner).binary("/opt/raxml/raxmlHPC");
    let err = raxml.check_version().unwrap_err();
    assert!(err.downcast_ref::<ApplicationError>().is_some());
    assert!(err.to_string().contains("7.2.6 is required, but running 7.2.8"));

    let runner = FakeRunner::new().not_installed();
    let err = fake_raxml(dir.path(), &runner).version().unwrap_err();
    assert!(err.downcast_ref::<ApplicationNotFoundError>().is_some());
}

#[test]
fn shell_runner_captures_streams() {
    let output = ShellRunner
        .run("echo out; echo err 1>&2; exit 3", false, false)
        .unwrap();
    assert_eq!(output.exit_code, Some(3));
    assert_eq!(output.stdout, "out\n");
    assert_eq!(output.stderr, "err\n");
    assert!(!output.success());

    let output = ShellRunner.run("echo out; echo err 1>&2", true, true).unwrap();
    assert!(output.success());
    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty());
}

#[test]
fn shell_characters_in_working_dir() {
    let raxml = Raxml::with_working_dir("/tmp/a \"b\" $HOME `id`/");
    assert_eq!(
        raxml.base_command(),
        format!("cd \"/tmp/a \\\"b\\\" \\$HOME \\`id\\`/\"; raxmlHPC {DEFAULT_FLAGS}")
    );
}

#[test]
fn escaped_dir_survives_the_shell() {
    let dir = tempdir().unwrap();
    let odd_dir = dir.path().join("we$ird \"dir\" `x` \\");
    fs::create_dir(&odd_dir).unwrap();
    let command = format!(
        "cd \"{}/\" && pwd -P",
        escape_double_quoted(&odd_dir.display().to_string())
    );
    let output = ShellRunner.run(&command, false, false).unwrap();
    assert!(output.success());
    assert_eq!(
        PathBuf::from(output.stdout.trim_end()),
        odd_dir.canonicalize().unwrap()
    );
}

#[test]
fn shell_characters_in_input_path() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in$put.phy");
    fs::write(&input, PHYLIP_RNA).unwrap();
    let runner = FakeRunner::standard_run();
    let mut raxml = fake_raxml(dir.path(), &runner);
    raxml.parameters.on("-m", "GTRCAT").unwrap();
    raxml.parameters.on("-n", "test_dollar").unwrap();

    let result = raxml.run(Some(InputData::Path(input.clone()))).unwrap();
    let expected = format!("-s \"{}/in\\$put.phy\"", dir.path().display());
    assert!(runner.last_command().contains(&expected));
    result.clean_up().unwrap();
}

#[test]
fn parameter_table_covers_raxml_flags() {
    let raxml = Raxml::new();
    let names: Vec<&str> = raxml.parameters.iter().map(|p| p.name).collect();
    let flags = "-a -A -b -B -c -d -D -e -E -f -F -g -h -i -I -j -k -K -l -L -m -M -n -o -O \
                 -p -P -q -r -R -s -S -t -T -u -v -w -W -x -y -Y -z -#";
    assert_eq!(names.len(), flags.split_whitespace().count());
    for flag in flags.split_whitespace() {
        assert!(names.contains(&flag), "{flag} missing");
    }
    let active: Vec<&str> = raxml
        .parameters
        .iter()
        .filter(|p| p.is_on())
        .map(|p| p.name)
        .collect();
    assert_eq!(active, ["-A", "-B", "-O", "-K", "-e", "-f", "-c", "-#"]);
}

#[test]
fn executable_lookup() {
    assert!(find_executable("sh").is_some());
    assert!(find_executable("surely-not-an-installed-binary").is_none());
    assert!(find_executable("/nonexistent/raxmlHPC").is_none());
}

#[test]
fn real_raxml_run() {
    if find_executable("raxmlHPC").is_none() {
        return;
    }
    let raxml = Raxml::with_working_dir(env::temp_dir());
    if raxml.check_version().is_err() {
        return;
    }
    let dir = tempdir().unwrap();
    let input = dir.path().join("raxml_test1.txt");
    fs::write(&input, PHYLIP_RNA).unwrap();
    let mut raxml = Raxml::with_working_dir(dir.path())
        .suppress_stdout(true)
        .suppress_stderr(true)
        .params(&required_params(&input, "test_me"))
        .unwrap();
    raxml.parameters.on("-p", 12345).unwrap();
    let result = raxml.run(None).unwrap();
    assert_eq!(result.tree(ResultKind::Result).unwrap().tips().len(), 7);
    result.clean_up().unwrap();
}
