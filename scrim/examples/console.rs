//! Scripted walk through a dropdown and a confirmation modal.
//!
//! Logs go to `console.log`; the final state is printed to stdout.

use std::fs::File;
use std::time::Duration;

use futures::channel::mpsc;
use scrim::prelude::*;
use simplelog::{Config, LevelFilter, WriteLogger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_file = File::create("console.log")?;
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)?;

    let mut host = Host::new();
    host.document_mut()
        .mount("body", Element::button("Remove member").id("remove"))?;

    let (dropdown, modal) = {
        let (env, doc) = host.parts();
        let dropdown = Dropdown::mount(
            env,
            doc,
            "body",
            DropdownProps::new(
                "subjects",
                [("Mathematics", "math"), ("Physics", "phys"), ("Chemistry", "chem")],
            )
            .config(SelectConfig::default().multiple(true).searchable(true))
            .on_change(|value| println!("subjects changed: {:?}", value)),
        )?;
        let modal = Modal::mount(
            env,
            doc,
            "body",
            ModalProps::new("confirm")
                .config(ModalConfig::default().title("Remove member?").close_on_escape(false))
                .body(vec![Element::text("This cannot be undone.")])
                .footer(vec![Element::button("Cancel").id("cancel")])
                .hooks(OverlayHooks::new().on_after_close(|| println!("modal closed"))),
        )?;
        (dropdown, modal)
    };

    let (tx, mut rx) = mpsc::unbounded();
    let script = tokio::spawn(async move {
        let step = Duration::from_millis(50);
        let events = [
            Event::click("subjects-trigger"),
            Event::input("subjects-search", "ph"),
            Event::key(Key::Down, Modifiers::new()),
            Event::key(Key::Enter, Modifiers::new()),
            Event::key(Key::Escape, Modifiers::new()),
            Event::click("remove"),
        ];
        for event in events {
            tokio::time::sleep(step).await;
            if tx.unbounded_send(event).is_err() {
                break;
            }
        }
    });

    // The remove button opens the modal.
    let open_modal = {
        let modal_overlay = modal.overlay().clone();
        host.env()
            .dispatcher
            .listen(scrim::dom::EventKind::Click, "demo", move |event, doc| {
                if event.target() == Some("remove") {
                    modal_overlay.open(doc);
                }
                scrim::Flow::Continue
            })
    };

    host.run(&mut rx).await;
    script.await?;
    host.settle().await;

    println!("subjects: {}", dropdown.display_label());
    println!("modal: {}, focus: {:?}", modal.phase(), host.focused());

    // Escape is disabled for this modal; Enter on the focused close button works.
    host.press(Key::Escape);
    println!("modal after escape: {}", modal.phase());
    host.press(Key::Enter);
    host.settle().await;
    println!("modal after close button: {}, focus: {:?}", modal.phase(), host.focused());

    drop(open_modal);
    Ok(())
}
