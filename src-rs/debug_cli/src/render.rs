use std::io::{self, Write};

use crate::models::{CLIConfig, ChatMessage, ExecuteResponse, InvokeResponse, ToolInfo};

pub fn banner(cfg: &CLIConfig) {
    println!("PayLink Agent Debug CLI");
    println!("API: {}", cfg.base_url);
    println!(
        "Model: {}  Temp: {:.2}",
        cfg.model.as_deref().unwrap_or("(server default)"),
        cfg.temperature
    );
    println!("Type /help for commands.");
}

pub fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

pub fn help() {
    println!("Commands:");
    println!("  /help                  Show commands");
    println!("  /exit | /quit          Exit");
    println!("  /tools                 List registered tools");
    println!("  /call <tool> [json]    Invoke a tool directly");
    println!("  /system <prompt>       Set system prompt");
    println!("  /model <name>          Set model");
    println!("  /temp <float>          Set temperature");
    println!("  /debug [on|off]        Toggle tool trace output");
    println!("  /history               Show chat history");
    println!("  /reset                 Clear chat history");
    println!("  /config                Show current config");
    println!("  /base <url>            Update base URL");
    println!("  /token <token>         Update bearer token");
}

pub fn response(resp: &ExecuteResponse, debug: bool) {
    if debug {
        for entry in resp.trace.iter().flatten() {
            let status = if entry.success { "ok" } else { "err" };
            println!("  [{}] {}({})", status, entry.tool, entry.args);
            if let Some(err) = &entry.error {
                println!("      error: {}", err);
            } else if let Some(output) = &entry.output {
                println!("      -> {}", output);
            }
        }
        println!("  iterations: {}", resp.iterations);
    }
    if let Some(err) = &resp.error {
        println!("error: {}", err);
        return;
    }
    if !resp.success {
        println!("error: request failed");
        return;
    }
    println!("assistant> {}", resp.output);
}

pub fn tools(tools: &[ToolInfo], debug: bool) {
    if tools.is_empty() {
        println!("no tools");
        return;
    }
    for tool in tools {
        let summary = tool.description.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        println!("{:<24} {}", tool.name, summary.trim());
        if debug {
            if let Some(params) = &tool.parameters {
                println!("    {}", params);
            }
        }
    }
}

pub fn invocation(resp: &InvokeResponse) {
    if resp.success {
        match &resp.output {
            Some(output) => println!(
                "{}",
                serde_json::to_string_pretty(output).unwrap_or_else(|_| output.to_string())
            ),
            None => println!("(no output)"),
        }
    } else {
        error(resp.error.as_deref().unwrap_or("unknown error"));
    }
}

pub fn config(cfg: &CLIConfig) {
    println!("config:");
    println!("  base: {}", cfg.base_url);
    println!("  model: {}", cfg.model.as_deref().unwrap_or("(server default)"));
    println!("  temp: {:.2}", cfg.temperature);
    println!("  debug: {}", cfg.debug);
    if let Some(system) = &cfg.system_prompt {
        println!("  system: {}", system);
    }
}

pub fn history(items: &[ChatMessage]) {
    if items.is_empty() {
        println!("no history");
        return;
    }
    for msg in items {
        println!("{}> {}", msg.role, msg.content);
    }
}

pub fn info(msg: &str) {
    println!("{}", msg);
}

pub fn error(msg: &str) {
    eprintln!("error: {}", msg);
}
