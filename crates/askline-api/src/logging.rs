//! Console logging of request/response traffic, gated on the verbose flag.

use colored::Colorize;

use askline_models::ChatRequest;

/// Safely truncate a string to a maximum number of characters
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let trunc_chars = if max_chars >= 3 { max_chars - 3 } else { 0 };
        format!("{}...", s.chars().take(trunc_chars).collect::<String>())
    }
}

/// Log outgoing request details
pub fn log_request(url: &str, request: &ChatRequest, verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "═".repeat(60).bright_cyan());
    println!("{}", "HTTP REQUEST".bright_cyan().bold());
    println!("{}: POST {}", "URL".bright_yellow(), url);
    match serde_json::to_string_pretty(request) {
        Ok(json) => println!("{}:\n{}", "Body".bright_yellow(), safe_truncate(&json, 2000)),
        Err(e) => println!("{}", format!("Error serializing request: {}", e).red()),
    }
    println!("{}", "═".repeat(60).bright_cyan());
}

/// Log the response status line
pub fn log_response(status: &reqwest::StatusCode, verbose: bool) {
    if !verbose {
        return;
    }

    if status.is_success() {
        println!("{} {}", "Response:".bright_green(), status);
    } else {
        println!("{} {}", "Response:".red(), status);
    }
}

/// Log one raw stream chunk by sequence number
pub fn log_stream_chunk(chunk_number: u32, chunk: &[u8], verbose: bool) {
    if !verbose {
        return;
    }

    let text = String::from_utf8_lossy(chunk);
    println!(
        "{} {}",
        format!("chunk {:>3}:", chunk_number).bright_black(),
        safe_truncate(text.trim_end(), 200).bright_black()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_truncate_limits_length() {
        let long_text = "x".repeat(1000);
        let truncated = safe_truncate(&long_text, 100);
        assert_eq!(truncated.chars().count(), 100);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn safe_truncate_leaves_short_text_alone() {
        assert_eq!(safe_truncate("Hello world", 100), "Hello world");
    }
}
