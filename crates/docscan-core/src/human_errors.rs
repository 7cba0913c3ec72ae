// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for whoever is holding the camera.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how a host presents the message.

use crate::error::DocscanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or timeout; trying again may work.
    Transient,
    /// User must do something (pick another file, fix the corners).
    ActionRequired,
    /// Retrying will not help (a damaged file, say).
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether retrying the same request could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `DocscanError` into a `HumanError`.
pub fn humanize_error(err: &DocscanError) -> HumanError {
    match err {
        DocscanError::InvalidInput(detail) => humanize_invalid_input(detail),

        DocscanError::UnsupportedFormat(detail) => HumanError {
            message: "This type of file isn't supported.".into(),
            suggestion: format!("Use a JPEG or PNG photo of the document. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        DocscanError::RemoteFetch { url, reason } => {
            let lower = reason.to_ascii_lowercase();
            if lower.contains("timed out") || lower.contains("timeout") {
                HumanError {
                    message: "The camera didn't respond in time.".into(),
                    suggestion: format!(
                        "Check the camera at {url} is switched on and on the same network, then try again."
                    ),
                    retriable: true,
                    severity: Severity::Transient,
                }
            } else if lower.contains("decode") {
                HumanError {
                    message: "The camera sent something that isn't a picture.".into(),
                    suggestion: format!(
                        "Make sure {url} is the camera's snapshot address (it should return a JPEG)."
                    ),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "We couldn't get a picture from the camera.".into(),
                    suggestion: format!("Check the camera address and try again. ({reason})"),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        DocscanError::Encode(_) => HumanError {
            message: "The scan couldn't be saved in that format.".into(),
            suggestion: "Try exporting as a JPEG image instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        DocscanError::Config(detail) => HumanError {
            message: "The scanner settings aren't valid.".into(),
            suggestion: format!("Fix the settings file or delete it to restore defaults. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        DocscanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or try a different folder.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        DocscanError::Serialization(_) => HumanError {
            message: "Some data couldn't be read.".into(),
            suggestion: "Check the corner coordinates or settings file are valid JSON.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

fn humanize_invalid_input(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("corner") || lower.contains("degenerate") || lower.contains("collinear") {
        HumanError {
            message: "The document corners don't form a page.".into(),
            suggestion: "Drag the four corners so they sit on the corners of the document, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("decode") || lower.contains("empty image") {
        HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        }
    } else {
        HumanError {
            message: "That request couldn't be processed.".into(),
            suggestion: format!("Check the values and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_transient() {
        let err = DocscanError::RemoteFetch {
            url: "http://10.0.0.5/shot.jpg".into(),
            reason: "operation timed out".into(),
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }

    #[test]
    fn undecodable_snapshot_needs_action() {
        let err = DocscanError::RemoteFetch {
            url: "http://10.0.0.5/".into(),
            reason: "could not decode image bytes".into(),
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn degenerate_corners_ask_for_new_corners() {
        let err = DocscanError::invalid("degenerate quadrilateral: width resolves to 0");
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.message.contains("corners"));
    }

    #[test]
    fn unsupported_format_needs_action() {
        let human = humanize_error(&DocscanError::UnsupportedFormat("scan.gif".into()));
        assert_eq!(human.severity, Severity::ActionRequired);
    }
}
