// ABOUTME: Interactive chat client binary: numbered menu driving the request/reply API
// ABOUTME: Name fields are pre-validated locally (§3); the server re-validates independently

use argh::FromArgs;
use chatrelay::client::{ChatClient, ChatResult, ClientBuilder};
use chatrelay::config::ClientConfig;
use chatrelay::Name;
use std::io::{self, BufRead, Write};

/// An interactive client for the chat relay.
#[derive(FromArgs)]
struct Args {
    /// relay host to connect to
    #[argh(option, default = "String::from(\"127.0.0.1\")")]
    host: String,

    /// relay port to connect to
    #[argh(option, default = "65432")]
    port: u16,
}

#[tokio::main]
async fn main() -> chatrelay::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Args = argh::from_env();
    let config = ClientConfig {
        host: args.host,
        port: args.port,
    };

    let mut client = ClientBuilder::connect(config.addr()).await?;
    println!("Connected to {}.", config.addr());

    loop {
        display_menu();
        match prompt("[]<- ").as_str() {
            "0" => break,
            "1" => message_menu(&mut client).await,
            "2" => join_leave_menu(&mut client).await,
            "3" => create_delete_menu(&mut client).await,
            "4" => show_reply(client.list_channels().await),
            "5" => show_reply(client.list_my_channels().await),
            "6" => {
                if let Some(name) = prompt_name("Channel Name: ") {
                    show_reply(client.list_channel_users(&name).await);
                }
            }
            "7" => show_reply(client.list_users().await),
            "8" => {
                if let Some(name) = prompt_name("New Name: ") {
                    show_reply(client.set_name(&name).await);
                }
            }
            "9" => empty_inbox(&mut client),
            _ => println!("Invalid Choice\n"),
        }

        if !client.is_connected() {
            println!("Connection lost.");
            break;
        }
    }

    client.disconnect().await?;
    Ok(())
}

fn display_menu() {
    println!(
        "[1] Message\n[2] Join/Leave Channels\n[3] Create/Delete Channel\n[4] List Channels\n\
         [5] List My Channels\n[6] List Channel Users\n[7] List Users\n[8] Set Name\n\
         [9] Empty Inbox\n[0] Quit\n"
    );
}

async fn message_menu(client: &mut impl ChatClient) {
    loop {
        println!("[0] Back\n[1] Message User\n[2] Message My Channels\n[3] Message Channels\n");
        match prompt("[]<- ").as_str() {
            "0" => break,
            "1" => {
                if let Some(name) = prompt_name("Username: ") {
                    let text = prompt("Message: ");
                    show_reply(client.message_user(&name, &text).await);
                }
            }
            "2" => {
                let text = prompt("Message: ");
                show_reply(client.message_my_channels(&text).await);
            }
            "3" => {
                let names = collect_channel_names();
                if names.is_empty() {
                    continue;
                }
                let text = prompt("Message: ");
                show_reply(client.message_channels(&names, &text).await);
            }
            _ => println!("Invalid Choice\n"),
        }
    }
}

async fn join_leave_menu(client: &mut impl ChatClient) {
    loop {
        println!("[0] Back\n[1] Join Channels\n[2] Leave Channels\n");
        match prompt("[]<- ").as_str() {
            "0" => break,
            "1" => {
                let names = collect_channel_names();
                if !names.is_empty() {
                    show_reply(client.join_channels(&names).await);
                }
            }
            "2" => {
                let names = collect_channel_names();
                if !names.is_empty() {
                    show_reply(client.leave_channels(&names).await);
                }
            }
            _ => println!("Invalid Choice\n"),
        }
    }
}

async fn create_delete_menu(client: &mut impl ChatClient) {
    loop {
        println!("[0] Back\n[1] Create Channel\n[2] Delete Channel\n");
        match prompt("[]<- ").as_str() {
            "0" => break,
            "1" => {
                if let Some(name) = prompt_name("Channel Name: ") {
                    show_reply(client.create_channel(&name).await);
                }
            }
            "2" => {
                if let Some(name) = prompt_name("Channel Name: ") {
                    show_reply(client.delete_channel(&name).await);
                }
            }
            _ => println!("Invalid Choice\n"),
        }
    }
}

fn empty_inbox(client: &mut impl ChatClient) {
    let mut count = 0;
    while let Some(line) = client.try_next_inbox() {
        print!("{line}");
        count += 1;
    }
    if count == 0 {
        println!("Inbox is empty.\n");
    }
}

/// Prompts for a sequence of channel names, one per line, stopping at the
/// first blank line. Invalid names are rejected locally and re-prompted.
fn collect_channel_names() -> Vec<String> {
    let mut names = Vec::new();
    loop {
        let raw = prompt("Channel name (blank to finish): ");
        if raw.is_empty() {
            break;
        }
        match raw.parse::<Name>() {
            Ok(_) => names.push(raw),
            Err(e) => print!("{e}"),
        }
    }
    names
}

/// Prompts for a single name field, validating it locally before returning.
/// Prints the validation error and returns `None` rather than sending an
/// invalid name to the server.
fn prompt_name(label: &str) -> Option<String> {
    let raw = prompt(label);
    match raw.parse::<Name>() {
        Ok(_) => Some(raw),
        Err(e) => {
            print!("{e}");
            None
        }
    }
}

fn prompt(label: &str) -> String {
    print!("{label}");
    io::stdout().flush().ok();
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok();
    line.trim().to_string()
}

fn show_reply(result: ChatResult<String>) {
    match result {
        Ok(text) => print!("\nChat:\n{text}\n"),
        Err(e) => println!("\nError: {e}\n"),
    }
}
