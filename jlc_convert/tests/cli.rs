use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn jlc_convert(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_jlc_convert"));
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

fn workdir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const KICAD_BOM: &str = "Reference,Value,Footprint\nR1,10k,R_0603\nR2,10k,R_0603\nC1,100n,C_0402\n";
const KICAD_POS: &str = "Ref,Val,Package,PosX,PosY,Rot,Side\nR1,10k,R_0603,1.5,2,370,top\nC1,100n,C_0402,3,4,-30,bottom\n";

#[test]
fn no_arguments_prints_help() {
    let dir = workdir(&[]);
    let output = jlc_convert(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    let text = stdout_of(&output) + &stderr_of(&output);
    assert!(text.contains("--fusion"), "{text}");
    assert!(text.contains("--kicad"), "{text}");
}

#[test]
fn kicad_both_artifacts() {
    let dir = workdir(&[("bom.csv", KICAD_BOM), ("pos.csv", KICAD_POS)]);
    let output = jlc_convert(dir.path())
        .args(["--kicad", "--bom", "bom.csv", "--pos", "pos.csv"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0), "{}", stderr_of(&output));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("BOM conversion completed: ./JLC_bom.csv"), "{stdout}");
    assert!(stdout.contains("Positions conversion completed: ./JLC_pos.csv"), "{stdout}");

    assert_eq!(
        fs::read_to_string(dir.path().join("JLC_bom.csv")).unwrap(),
        "Comment,Designator,Footprint,JLCPCB Part #（optional）\n\
         10k,\"R1, R2\",R_0603,\n\
         100n,C1,C_0402,\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("JLC_pos.csv")).unwrap(),
        "Designator,Mid X,Mid Y,Layer,Rotation\n\
         R1,1.5000,2.0000,Top,10.00\n\
         C1,3.0000,4.0000,Bottom,330.00\n"
    );
}

#[test]
fn output_prefix_and_directory() {
    let dir = workdir(&[("bom.csv", KICAD_BOM)]);
    fs::create_dir(dir.path().join("out")).unwrap();
    jlc_convert(dir.path())
        .args(["--kicad", "--bom", "bom.csv", "--out", "board", "--out-dir", "out"])
        .assert()
        .success();
    assert!(dir.path().join("out/board_bom.csv").is_file());
    assert!(!dir.path().join("JLC_bom.csv").exists());
}

#[test]
fn sorted_bom_lines() {
    let dir = workdir(&[("bom.csv", KICAD_BOM)]);
    jlc_convert(dir.path())
        .args(["--kicad", "--bom", "bom.csv", "--sort"])
        .assert()
        .success();
    let out = fs::read_to_string(dir.path().join("JLC_bom.csv")).unwrap();
    assert_eq!(out.lines().nth(1), Some("100n,C1,C_0402,"));
}

#[test]
fn fusion_front_back_pair() {
    let dir = workdir(&[
        ("board_front.csv", "Name,X,Y,Angle\nU1,10,20,90\n"),
        ("board_back.csv", "Name,X,Y,Angle\nR7,1,2,0\n"),
    ]);
    jlc_convert(dir.path())
        .args(["--fusion", "--pos", "board_back.csv"])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(dir.path().join("JLC_pos.csv")).unwrap(),
        "Designator,Mid X,Mid Y,Layer,Rotation\n\
         U1,10.0000,20.0000,Top,90.00\n\
         R7,1.0000,2.0000,Bottom,0.00\n"
    );
}

#[test]
fn missing_counterpart_is_a_warning() {
    let dir = workdir(&[("board_back.csv", "Name,X,Y,Angle\nR7,1,2,0\n")]);
    let output = jlc_convert(dir.path())
        .args(["--fusion", "--pos", "board_back.csv"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(stderr_of(&output).contains("board_front.csv"), "{}", stderr_of(&output));
    let out = fs::read_to_string(dir.path().join("JLC_pos.csv")).unwrap();
    assert_eq!(out.lines().nth(1), Some("R7,1.0000,2.0000,Bottom,0.00"));
}

#[test]
fn format_flag_is_required() {
    let dir = workdir(&[("bom.csv", KICAD_BOM)]);
    let output = jlc_convert(dir.path())
        .args(["--bom", "bom.csv"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("--fusion or --kicad"));
}

#[test]
fn format_flags_conflict() {
    let dir = workdir(&[("bom.csv", KICAD_BOM)]);
    jlc_convert(dir.path())
        .args(["--fusion", "--kicad", "--bom", "bom.csv"])
        .assert()
        .code(2);
}

#[test]
fn an_input_is_required() {
    let dir = workdir(&[]);
    let output = jlc_convert(dir.path()).arg("--kicad").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("--bom or --pos"));
}

#[test]
fn missing_input_file() {
    let dir = workdir(&[]);
    let output = jlc_convert(dir.path())
        .args(["--kicad", "--bom", "nope.csv"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("nope.csv"));
    assert!(!dir.path().join("JLC_bom.csv").exists());
}

#[test]
fn failed_artifact_does_not_block_the_other() {
    let dir = workdir(&[("bom.csv", "Foo,Bar\n1,2\n"), ("pos.csv", KICAD_POS)]);
    let output = jlc_convert(dir.path())
        .args(["--kicad", "--bom", "bom.csv", "--pos", "pos.csv"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("Foo, Bar"), "{}", stderr_of(&output));
    assert!(!dir.path().join("JLC_bom.csv").exists());
    assert!(dir.path().join("JLC_pos.csv").is_file());
}

#[test]
fn malformed_row_is_reported() {
    let dir = workdir(&[(
        "pos.csv",
        "Ref,PosX,PosY,Rot,Side\nR1,1,1,0,top\nR2,1,1,0,sideways\n",
    )]);
    let output = jlc_convert(dir.path())
        .args(["--kicad", "--pos", "pos.csv"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr_of(&output);
    assert!(stderr.contains("pos.csv:3:"), "{stderr}");
    assert!(stderr.contains("field 'side'"), "{stderr}");
}
