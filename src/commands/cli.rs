//! Command line definition

use clap::{value_parser, Arg, ArgAction, Command as ClapCommand};

/// Build the clap command for the `crskit` binary
pub fn build_cli() -> ClapCommand {
    ClapCommand::new("CrsKit")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Maurice Schilpp")
        .about("Transform coordinates and bounding boxes between coordinate reference systems")
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .help("Source CRS: catalog id (EPSG:4326), alias, WKT or PROJ string")
                .value_name("CRS")
                .required(false),
        )
        .arg(
            Arg::new("dest")
                .short('d')
                .long("dest")
                .help("Destination CRS: catalog id (EPSG:3857), alias, WKT or PROJ string")
                .value_name("CRS")
                .required(false),
        )
        .arg(
            Arg::new("point")
                .short('p')
                .long("point")
                .help("Point to transform in 'x,y' or 'x,y,z' format")
                .value_name("POINT")
                .allow_hyphen_values(true)
                .required(false),
        )
        .arg(
            Arg::new("bbox")
                .long("bbox")
                .help("Bounding box to transform (minx,miny,maxx,maxy)")
                .value_name("BBOX")
                .allow_hyphen_values(true)
                .required(false),
        )
        .arg(
            Arg::new("segments")
                .long("segments")
                .help("Segments per bounding box edge used for densification")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .required(false),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .help("Coordinate file with one 'x,y[,z]' point per line")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output file for transformed coordinates (default: stdout)")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("reverse")
                .short('r')
                .long("reverse")
                .help("Transform from destination to source")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("precision")
                .long("precision")
                .help("Number of decimals in printed coordinates")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .required(false),
        )
        .arg(
            Arg::new("save-state")
                .long("save-state")
                .help("Save the CRS pair to an XML state file")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("load-state")
                .long("load-state")
                .help("Load the CRS pair from an XML state file")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("definitions")
                .long("definitions")
                .help("TOML file with additional aliases and user CRS definitions")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write log output to this file instead of the console logger")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_negative_coordinates_parse() {
        let matches = build_cli()
            .try_get_matches_from(["crskit", "--source", "EPSG:4326", "--dest", "EPSG:3857",
                                   "--bbox", "-10,-10,10,10", "--segments", "8"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("bbox").map(String::as_str), Some("-10,-10,10,10"));
        assert_eq!(matches.get_one::<usize>("segments"), Some(&8));
        assert!(!matches.get_flag("reverse"));
    }
}
