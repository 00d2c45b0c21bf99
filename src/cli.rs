use npcli::{Chain, ConfigError, ElementFormat, InputFormat, InputSpec, Invocation, OutputMode};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parsed command-line arguments
#[derive(Debug, Default)]
pub(crate) struct CliArgs {
    /// Primary expression followed by each `-e`, in order
    pub(crate) expressions: Vec<String>,
    pub(crate) has_primary: bool,
    pub(crate) sources: Vec<InputSpec>,
    pub(crate) input_format: InputFormat,
    pub(crate) kitchen_sink: bool,
    pub(crate) modules: Vec<String>,
    /// Output mode and the flag that chose it
    pub(crate) output: Option<(&'static str, OutputMode)>,
    pub(crate) code: bool,
    pub(crate) debug: bool,
    pub(crate) help: bool,
    pub(crate) version: bool,
}

impl CliArgs {
    fn set_output(&mut self, flag: &'static str, mode: OutputMode) -> Result<(), ConfigError> {
        match self.output {
            Some((previous, _)) if previous != flag => {
                Err(ConfigError::ConflictingOutputModes(previous, flag))
            }
            _ => {
                self.output = Some((flag, mode));
                Ok(())
            }
        }
    }

    /// Validate into something `pipeline::run` accepts
    pub(crate) fn into_invocation(self) -> Result<Invocation, ConfigError> {
        if !self.has_primary {
            return Err(ConfigError::MissingExpression);
        }
        Ok(Invocation {
            chain: Chain::new(self.expressions)?,
            sources: self.sources,
            format: self.input_format,
            options: npcli::BindOptions {
                kitchen_sink: self.kitchen_sink,
                modules: self.modules,
            },
            output: self.output.map(|(_, mode)| mode).unwrap_or_default(),
            code: self.code,
        })
    }
}

/// Parse command-line arguments
///
/// The primary expression is the first positional argument wherever it
/// appears; the rest are sources. `-e` expressions always follow it in the
/// chain.
pub(crate) fn parse_args(args: &[String]) -> Result<CliArgs, ConfigError> {
    let mut cli = CliArgs::default();
    let mut extra: Vec<String> = Vec::new();
    let mut primary: Option<String> = None;
    let mut options_done = false;

    let mut i = 1; // Skip program name
    while i < args.len() {
        let arg = args[i].as_str();
        if options_done || arg == "-" || !arg.starts_with('-') {
            if primary.is_none() {
                primary = Some(arg.to_string());
            } else {
                cli.sources.push(InputSpec::unnamed(arg.parse()?));
            }
            i += 1;
            continue;
        }

        // --flag=value
        let (flag, inline) = match arg.split_once('=') {
            Some((f, v)) if f.starts_with("--") => (f, Some(v.to_string())),
            _ => (arg, None),
        };
        let mut value = || -> Result<String, ConfigError> {
            if let Some(v) = inline.clone() {
                return Ok(v);
            }
            i += 1;
            args.get(i).cloned().ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
        };

        match flag {
            "--" => options_done = true,
            "-e" | "--expr" => extra.push(value()?),
            "-n" | "--name" => cli.sources.push(InputSpec::parse_named(&value()?)?),
            "-I" | "--input-format" => cli.input_format = value()?.parse()?,
            "-k" | "--kitchen-sink" => cli.kitchen_sink = true,
            "-m" | "--module" => cli.modules.push(value()?),
            "-a" | "--array" => {
                let element = match cli.output {
                    Some((_, OutputMode::Array { element })) => element,
                    _ => ElementFormat::Default,
                };
                cli.set_output("--array", OutputMode::Array { element })?
            }
            "-F" | "--array-format" | "-R" | "--raw-format" => {
                let element = value()?.parse()?;
                cli.set_output("--array", OutputMode::Array { element })?
            }
            "-r" | "--raw" => cli.set_output("--raw", OutputMode::Raw)?,
            "--repr" => cli.set_output("--repr", OutputMode::Repr)?,
            "-q" | "--no-result" => cli.set_output("--no-result", OutputMode::Discard)?,
            "--code" => cli.code = true,
            "--debug" => cli.debug = true,
            "--help" | "-h" => cli.help = true,
            "--version" | "-V" => cli.version = true,
            other => return Err(ConfigError::UnknownFlag(other.to_string())),
        }
        i += 1;
    }

    cli.has_primary = primary.is_some();
    cli.expressions = primary.into_iter().chain(extra).collect();
    Ok(cli)
}

pub(crate) fn print_help() {
    println!(
        r#"npcli {} - evaluate numpy-style array expressions over piped data

USAGE:
    npcli [OPTIONS] EXPR [SOURCE ...]

    Sources are read into d1, d2, ... (d is d1). Use '-' for stdin and
    'fd:N' for an open file descriptor. With no sources, stdin is read
    when EXPR mentions d or data.

EXAMPLES:
    seq 10 | npcli 'd * 2'
    seq 10 | npcli 'd.sum()' --repr
    npcli 'd1 + d2' a.txt b.txt
    npcli -n one=a.txt -n two=b.txt 'one + two'
    seq 5 | npcli 'd * 2' -e 'd + 4' -e 'd.mean()'
    npcli -I lines -F str 'd[::-1]' notes.txt

INPUT:
    -n, --name NAME=SOURCE  Named source, bound only as NAME
    -I, --input-format FMT  auto (whitespace numbers, default), lines,
                            str, csv, pandas (csv with a header row)

EVALUATION:
    -e, --expr EXPR         Chain another expression; d is the result
                            of the previous one
    -m, --module NAME       Import a module (np, numpy, math, random)
    -k, --kitchen-sink      Bind math, random, pi, e, sqrt, mean, ...
    --code                  Print the program that would run, and exit

OUTPUT (at most one):
    -a, --array             One element per line (default)
    -F, --array-format FMT  Element format: default, str, int, float,
                            .N or %.Nf
    -r, --raw               The result is a string; write it as is
    --repr                  Debug representation
    -q, --no-result         Write nothing

OTHER:
    --debug                 Debug logging to stderr (or set NPCLI_LOG)
    -h, --help              Show this help message
    -V, --version           Show version
"#,
        VERSION
    );
}

pub(crate) fn print_version() {
    println!("npcli {}", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;
    use npcli::Location;

    fn parse(args: &[&str]) -> Result<CliArgs, ConfigError> {
        let mut argv = vec!["npcli".to_string()];
        argv.extend(args.iter().map(|s| s.to_string()));
        parse_args(&argv)
    }

    #[test]
    fn expression_and_sources() {
        let cli = parse(&["d1 + d2", "a.txt", "-"]).unwrap();
        assert_eq!(cli.expressions, vec!["d1 + d2"]);
        assert_eq!(
            cli.sources,
            vec![
                InputSpec::unnamed(Location::Path("a.txt".into())),
                InputSpec::unnamed(Location::Stdin),
            ]
        );
    }

    #[test]
    fn chain_order() {
        let cli = parse(&["-e", "d + 1", "d * 2", "-e", "d.sum()"]).unwrap();
        assert_eq!(cli.expressions, vec!["d * 2", "d + 1", "d.sum()"]);
    }

    #[test]
    fn named_sources_keep_declaration_order() {
        let cli = parse(&["d + x", "a", "--name", "x=b", "c", "--name=y=fd:3"]).unwrap();
        let names: Vec<Option<&str>> = cli.sources.iter().map(|s| s.name.as_deref()).collect();
        assert_eq!(names, vec![None, Some("x"), None, Some("y")]);
        assert_eq!(cli.sources[3].location, Location::Descriptor(3));
    }

    #[test]
    fn conflicting_output_modes() {
        assert_eq!(
            parse(&["d", "--raw", "--repr"]).unwrap_err(),
            ConfigError::ConflictingOutputModes("--raw", "--repr")
        );
        assert_eq!(
            parse(&["d", "-F", ".2", "-q"]).unwrap_err(),
            ConfigError::ConflictingOutputModes("--array", "--no-result")
        );
        assert!(parse(&["d", "-a", "-F", "int"]).is_ok());
    }

    #[test]
    fn output_defaults_to_array() {
        let inv = parse(&["d"]).unwrap().into_invocation().unwrap();
        assert_eq!(inv.output, OutputMode::Array { element: ElementFormat::Default });
        let inv = parse(&["d", "-F", "%.3f"]).unwrap().into_invocation().unwrap();
        assert_eq!(inv.output, OutputMode::Array { element: ElementFormat::Fixed(3) });
    }

    #[test]
    fn bad_values() {
        assert_eq!(
            parse(&["d", "-I", "xml"]).unwrap_err(),
            ConfigError::UnknownInputFormat("xml".into())
        );
        assert_eq!(parse(&["d", "-e"]).unwrap_err(), ConfigError::MissingValue("-e".into()));
        assert_eq!(parse(&["d", "--frob"]).unwrap_err(), ConfigError::UnknownFlag("--frob".into()));
        assert_eq!(
            parse(&["d", "-n", "1x=a"]).unwrap_err(),
            ConfigError::InvalidSourceName("1x=a".into())
        );
    }

    #[test]
    fn missing_expression() {
        let cli = parse(&["--help"]).unwrap();
        assert!(cli.help);
        assert_eq!(cli.into_invocation().unwrap_err(), ConfigError::MissingExpression);
    }

    #[test]
    fn double_dash_ends_options() {
        let cli = parse(&["--", "-d", "-x.txt"]).unwrap();
        assert_eq!(cli.expressions, vec!["-d"]);
        assert_eq!(cli.sources, vec![InputSpec::unnamed(Location::Path("-x.txt".into()))]);
    }
}
