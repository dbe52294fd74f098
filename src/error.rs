// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// List of all errors.
#[derive(Debug)]
pub enum Error {
    /// A bad SVG attribute, an unparseable number, an unknown path letter
    /// or a truncated path.
    ///
    /// Fatal for the current file.
    MalformedInput(String),

    /// An emission-stage violation, like a line run with no points.
    ///
    /// Indicates an upstream defect rather than bad user input.
    InvalidBytecode(String),

    /// A broken pack file: bad magic, an oversized section or an image
    /// header that disagrees with the payload.
    InvalidContainer(String),

    /// Failed to parse the SVG XML.
    ParsingFailed(roxmltree::Error),

    /// A file read/write failure, propagated unchanged.
    Io(std::io::Error),
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::ParsingFailed(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::MalformedInput(ref msg) => {
                write!(f, "malformed input: {}", msg)
            }
            Error::InvalidBytecode(ref msg) => {
                write!(f, "invalid bytecode: {}", msg)
            }
            Error::InvalidContainer(ref msg) => {
                write!(f, "invalid container: {}", msg)
            }
            Error::ParsingFailed(ref e) => {
                write!(f, "SVG data parsing failed cause {}", e)
            }
            Error::Io(ref e) => {
                write!(f, "{}", e)
            }
        }
    }
}

impl std::error::Error for Error {}
