use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use ctm_converter::cli::Cli;
use ctm_converter::convert;
use ctm_converter::model::{ColorMethod, Project, SUPPORTED_VERSION, ScreenMode, TILE_SYSTEM_FLAG};
use ctm_converter::writer::ctm;
use pretty_assertions::assert_eq;

const A: [u8; 8] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80];
const B: [u8; 8] = [0xc0, 0x30, 0, 0, 0, 0, 0, 0x01];

fn mirrored_tile_project() -> Project {
    let mut a_y = A;
    a_y.reverse();
    Project {
        version: SUPPORTED_VERSION,
        colors: [0, 11, 12, 1, 0, 0],
        color_method: ColorMethod::PerChar,
        screen_mode: ScreenMode::Multicolor,
        flags: TILE_SYSTEM_FLAG,
        chars: vec![A, A, a_y, B],
        char_attributes: vec![8; 4],
        tile_width: 2,
        tile_height: 2,
        tile_data: vec![0, 1, 2, 3],
        tile_colors: None,
        tile_tags: vec![0],
        tile_names: vec!["corner".to_string()],
        map_width: 1,
        map_height: 1,
        map_data: vec![0],
    }
}

fn save(project: &Project, path: &Path) {
    let mut bytes = Vec::new();
    ctm::write(project, &mut bytes).unwrap();
    fs::write(path, bytes).unwrap();
}

fn cli(input: PathBuf, output: Option<PathBuf>, report: Option<PathBuf>) -> Cli {
    Cli {
        input,
        output,
        append: Vec::new(),
        report,
    }
}

#[test]
fn converts_mirrored_tile() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("level.ctm");
    let output = dir.path().join("level.asm");
    let report = dir.path().join("level.json");
    save(&mirrored_tile_project(), &input);

    convert(&cli(input, Some(output.clone()), Some(report.clone()))).unwrap();

    let asm = fs::read_to_string(&output).unwrap();
    assert!(asm.starts_with("//\n// Auto-generated by CTMConverter tool.\n//\n"));
    assert!(asm.contains("// Number of chars = 2\n"));
    assert!(asm.contains("// Number of vir chars = 3\n"));
    assert!(asm.contains("// Max number of active physical chars = 3\n"));
    assert!(asm.contains(".label kTileMapWidth = 1\n"));

    let stats: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(stats["vir_chars"], 3);
    assert_eq!(stats["validation"]["max_physical_chars"], 3);
}

#[test]
fn without_output_nothing_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("level.ctm");
    save(&mirrored_tile_project(), &input);

    convert(&cli(input, None, None)).unwrap();

    let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[test]
fn appended_projects_are_joined_side_by_side() {
    let dir = tempfile::tempdir().unwrap();
    let left = dir.path().join("left.ctm");
    let right = dir.path().join("right.ctm");
    let output = dir.path().join("joined.asm");
    save(&mirrored_tile_project(), &left);
    save(&mirrored_tile_project(), &right);

    let args = Cli {
        append: vec![right],
        ..cli(left, Some(output.clone()), None)
    };
    convert(&args).unwrap();

    let asm = fs::read_to_string(&output).unwrap();
    assert!(asm.contains(".label kTileMapWidth = 2\n"));
    // the right half is an exact copy, so everything folds together
    assert!(asm.contains("// Number of chars = 2\n"));
    assert!(asm.contains("// Number of tiles = 1\n"));
    assert!(asm.contains("// Number of vir tiles = 1\n"));
}

#[test]
fn bad_input_is_reported_with_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.ctm");
    fs::write(&input, b"XYZ\x07").unwrap();

    let err = convert(&cli(input, None, None)).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("broken.ctm"), "{message}");
    assert!(message.contains("bad signature"), "{message}");
}

#[test]
fn unwritable_output_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("level.ctm");
    save(&mirrored_tile_project(), &input);
    let output = dir.path().join("missing").join("level.asm");

    let err = convert(&cli(input, Some(output), None)).unwrap_err();
    assert!(format!("{err:#}").contains("level.asm"));
}

#[test]
fn positional_output_is_written_not_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("level.ctm");
    let output = dir.path().join("level.asm");
    save(&mirrored_tile_project(), &input);

    let args = Cli::try_parse_from([
        OsStr::new("ctm-converter"),
        input.as_os_str(),
        output.as_os_str(),
    ])
    .unwrap();
    convert(&args).unwrap();

    assert!(fs::read_to_string(&output).unwrap().contains("TileMapData:"));
}
