#![allow(non_snake_case)]
//! Line oriented front end: every line of stdin is one command of the session,
//! replies go to stdout and rendered images into the configured directory.
//!
//! Usage: `RustedNLD [config.toml]`
use RustedNLD::Utils::config::NldConfig;
use RustedNLD::Utils::logger::init_logger;
use RustedNLD::Utils::plots::PhasePortraitRenderer;
use RustedNLD::session::controller::{Reply, Session};
use RustedNLD::session::dispatch::dispatch;
use log::{error, info, warn};
use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

fn print_replies(replies: &[Reply]) {
    for reply in replies {
        println!("{}", reply);
    }
}

fn main() -> ExitCode {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match NldConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    match init_logger(config.logging.level, config.logging.to_file) {
        Ok(true) => {}
        Ok(false) => warn!("logger was already initialised"),
        Err(e) => eprintln!("cannot create log file: {}", e),
    }
    if let Err(e) = std::fs::create_dir_all(&config.render.output_dir) {
        error!(
            "cannot create output directory {}: {}",
            config.render.output_dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }
    let renderer = PhasePortraitRenderer {
        output_dir: config.render.output_dir.clone(),
        width: config.render.width,
        height: config.render.height,
        segment_len: config.render.segment_len,
        time_label: config.session.time_symbol.clone(),
    };
    let mut session = Session::new(&config, Box::new(renderer));
    info!("session started, solver {}", config.solver.method);
    println!("Enter '$nld' to start writing equations of motion");

    let (tx, rx) = mpsc::channel::<String>();
    // detached, ends with stdin
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("cannot read stdin: {}", e);
                    break;
                }
            }
        }
    });

    let mut queue: VecDeque<String> = VecDeque::new();
    loop {
        let line = match queue.pop_front() {
            Some(line) => line,
            None => match rx.recv() {
                Ok(line) => line,
                Err(_) => break,
            },
        };
        match dispatch(&mut session, &line, &rx, &mut queue) {
            Ok(replies) => print_replies(&replies),
            Err(_) => error!("command '{}' panicked, session state kept", line),
        }
    }
    info!(" \n \n Program ended");
    ExitCode::SUCCESS
}
