use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Input .ctm project file
    pub input: PathBuf,
    /// Output assembly file; without it the map is only checked
    pub output: Option<PathBuf>,
    /// Further project files joined to the right of the input, in order
    #[arg(long, value_name = "PATH", num_args = 1..)]
    pub append: Vec<PathBuf>,
    /// Write conversion statistics as JSON
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_and_output_are_positional() {
        let cli = Cli::try_parse_from(["ctm-converter", "in.ctm", "out.asm"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("in.ctm"));
        assert_eq!(cli.output, Some(PathBuf::from("out.asm")));
        assert!(cli.append.is_empty());
    }

    #[test]
    fn output_is_optional() {
        let cli = Cli::try_parse_from(["ctm-converter", "in.ctm"]).unwrap();
        assert_eq!(cli.output, None);
    }

    #[test]
    fn missing_input_is_a_usage_error() {
        assert!(Cli::try_parse_from(["ctm-converter"]).is_err());
    }

    #[test]
    fn append_takes_several_files() {
        let cli = Cli::try_parse_from([
            "ctm-converter",
            "in.ctm",
            "out.asm",
            "--append",
            "b.ctm",
            "c.ctm",
        ])
        .unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("out.asm")));
        assert_eq!(cli.append, vec![PathBuf::from("b.ctm"), PathBuf::from("c.ctm")]);
    }
}
