use clap::Parser;

use crate::DetectorOptions;

#[derive(Parser, Debug)]
#[command(
    name = "urldetect",
    version,
    about = "Scan text for URLs, bare domains, and IPs",
    disable_help_flag = true,
    disable_version_flag = true,
    after_help = "\
Example invocations:
  # Pull every URL out of a log file.
  urldetect access.log

  # Scan HTML markup and print normalized forms.
  urldetect --html --normalize page.html",
    help_template = "\
{name} {version} - {about}

{usage-heading} {usage}{before-help}{all-args}{after-help}"
)]
pub struct Args {
    /// Treat input as HTML markup (quotes and angle brackets terminate
    /// a candidate)
    #[arg(long = "html", help_heading = "Matching Control")]
    pub html: bool,

    /// Treat input as a JSON document (quotes and brackets terminate a
    /// candidate)
    #[arg(long = "json", help_heading = "Matching Control")]
    pub json: bool,

    /// Treat input as JavaScript source (quotes, single quotes, and
    /// brackets terminate a candidate)
    #[arg(long = "javascript", help_heading = "Matching Control")]
    pub javascript: bool,

    /// Treat input as an XML document (quotes and angle brackets
    /// terminate a candidate)
    #[arg(long = "xml", help_heading = "Matching Control")]
    pub xml: bool,

    /// Double quotes terminate a candidate
    #[arg(long = "quote-match", help_heading = "Matching Control")]
    pub quote_match: bool,

    /// Single quotes terminate a candidate
    #[arg(long = "single-quote-match", help_heading = "Matching Control")]
    pub single_quote_match: bool,

    /// Brackets and braces terminate a candidate
    #[arg(long = "bracket-match", help_heading = "Matching Control")]
    pub bracket_match: bool,

    /// Allow bare single-label hosts (e.g. "localhost") as domains
    #[arg(long = "single-level-domain", help_heading = "Matching Control")]
    pub single_level_domain: bool,

    /// Print each URL's normalized (host- and path-canonicalized) form
    #[arg(long = "normalize", help_heading = "General Output Control")]
    pub normalize: bool,

    /// Show help
    #[arg(
        long = "help",
        action = clap::ArgAction::Help,
        help_heading = "Generic Program Information"
    )]
    pub help: Option<bool>,

    /// Show program version
    #[arg(
        short = 'V',
        long = "version",
        action = clap::ArgAction::Version,
        help_heading = "Generic Program Information"
    )]
    pub version: Option<bool>,

    /// Input files. If none (or '-') given, stdin is read.
    pub haystacks: Vec<String>,
}

impl Args {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Convert the matching-control flags into a `DetectorOptions`
    /// bitmask (the same shape `Args::into_parameters` builds `ipgrep`'s
    /// `Parameters` from).
    pub fn into_options(&self) -> DetectorOptions {
        let mut options = DetectorOptions::DEFAULT;
        if self.html {
            options = options.union(DetectorOptions::HTML);
        }
        if self.json {
            options = options.union(DetectorOptions::JSON);
        }
        if self.javascript {
            options = options.union(DetectorOptions::JAVASCRIPT);
        }
        if self.xml {
            options = options.union(DetectorOptions::XML);
        }
        if self.quote_match {
            options = options.union(DetectorOptions::QUOTE_MATCH);
        }
        if self.single_quote_match {
            options = options.union(DetectorOptions::SINGLE_QUOTE_MATCH);
        }
        if self.bracket_match {
            options = options.union(DetectorOptions::BRACKET_MATCH);
        }
        if self.single_level_domain {
            options = options.union(DetectorOptions::ALLOW_SINGLE_LEVEL_DOMAIN);
        }
        options
    }
}
