//! Shared fixtures for unit tests.

use bzip2::write::BzEncoder;
use bzip2::Compression;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// 2013: two January rows, one February row in Alabama; one Arizona row with
/// both coordinates unknown.
pub const ACCIDENTS_2013: &str = "\
STATE,ST_CASE,MONTH,YEAR,LATITUDE,LONGITUD
1,10001,1,2013,32.5,-86.2
1,10002,1,2013,99.9999,999.9999
1,10003,2,2013,33.1,-87.0
4,40001,2,2013,99.9999,999.9999
";

/// 2014: three March rows and one January row.
pub const ACCIDENTS_2014: &str = "\
STATE,ST_CASE,MONTH,YEAR,LATITUDE,LONGITUD
1,10001,3,2014,31.9,-85.7
1,10002,3,2014,34.0,-86.9
6,60001,3,2014,36.7,-119.7
6,60002,1,2014,34.1,-118.2
";

/// Write `content` bzip2-compressed as `dir/name`.
pub fn write_bz2(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let mut encoder = BzEncoder::new(file, Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}
