//! Minimal interactive demo: a hoverable, clickable panel on a filled
//! canvas.
//!
//! Run with `cargo run --example demo`. Move the mouse over the panel,
//! click it, resize the window; press `q` or Escape to quit.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use weft::prelude::*;

const PANEL: Rect = Rect::new(4, 2, 24, 6);

#[derive(Default)]
struct PanelState {
    hovered: bool,
    clicks: u32,
    cursor: Option<Position>,
}

/// The panel's mouse listener; shares state with the rendering control.
struct Panel {
    state: Rc<RefCell<PanelState>>,
    handle: Rc<RefCell<Option<InvalidationHandle>>>,
}

impl Panel {
    fn invalidate(&self) {
        let handle = self.handle.borrow().clone();
        if let Some(handle) = handle {
            handle.invalidate(PANEL);
        }
    }
}

impl MouseListener for Panel {
    fn on_mouse_enter(&self) {
        self.state.borrow_mut().hovered = true;
        self.invalidate();
    }

    fn on_mouse_move(&self, position: Position) {
        self.state.borrow_mut().cursor = Some(position);
        self.invalidate();
    }

    fn on_mouse_leave(&self) {
        let mut state = self.state.borrow_mut();
        state.hovered = false;
        state.cursor = None;
        drop(state);
        self.invalidate();
    }

    fn on_mouse_down(&self, _position: Position) {
        self.state.borrow_mut().clicks += 1;
        self.invalidate();
    }
}

/// Root content: dotted backdrop, the panel, and a status line.
struct Demo {
    size: RefCell<Size>,
    state: Rc<RefCell<PanelState>>,
    panel: Rc<Panel>,
    handle: Rc<RefCell<Option<InvalidationHandle>>>,
}

impl Demo {
    fn new() -> Rc<Self> {
        let state = Rc::new(RefCell::new(PanelState::default()));
        let handle = Rc::new(RefCell::new(None));
        let panel = Rc::new(Panel {
            state: state.clone(),
            handle: handle.clone(),
        });
        Rc::new(Self {
            size: RefCell::new(Size::ZERO),
            state,
            panel,
            handle,
        })
    }

    fn status_line(&self) -> String {
        let state = self.state.borrow();
        let cursor = match state.cursor {
            Some(position) => format!("({},{})", position.x, position.y),
            None => "outside".to_string(),
        };
        format!(" clicks: {}  cursor: {}  q quits", state.clicks, cursor)
    }
}

impl Control for Demo {
    fn arrange(&self, _min: Size, max: Size) -> Size {
        *self.size.borrow_mut() = max;
        max
    }

    fn cell_at(&self, position: Position) -> Cell {
        let size = *self.size.borrow();

        // Bottom row: status text.
        if size.height > 0 && position.y == size.height - 1 {
            let ch = self
                .status_line()
                .chars()
                .nth(position.x as usize)
                .unwrap_or(' ');
            return Cell::from_char(ch)
                .with_fg(Color::Ansi(0))
                .with_bg(Color::Ansi(7));
        }

        if PANEL.contains(position) {
            let hovered = self.state.borrow().hovered;
            let bg = if hovered {
                Color::Ansi(4)
            } else {
                Color::Ansi(6)
            };
            let label = "click me";
            let label_y = PANEL.y + PANEL.height / 2;
            let label_x = PANEL.x + (PANEL.width.saturating_sub(label.len() as u16)) / 2;
            let ch = if position.y == label_y
                && position.x >= label_x
                && ((position.x - label_x) as usize) < label.len()
            {
                label.chars().nth((position.x - label_x) as usize).unwrap()
            } else {
                ' '
            };
            return Cell::from_char(ch)
                .with_fg(Color::Ansi(15))
                .with_bg(bg)
                .with_flags(if hovered {
                    StyleFlags::BOLD
                } else {
                    StyleFlags::empty()
                });
        }

        Cell::from_char('·').with_fg(Color::Ansi(8))
    }

    fn hit_test(&self, position: Position) -> Option<MouseTarget> {
        if PANEL.contains(position) {
            let origin = Position::new(PANEL.x, PANEL.y);
            let relative = position.relative_to(origin)?;
            Some(MouseTarget::new(self.panel.clone(), relative))
        } else {
            None
        }
    }

    fn attach(&self, surface: InvalidationHandle) {
        *self.handle.borrow_mut() = Some(surface);
    }

    fn detach(&self) {
        self.handle.borrow_mut().take();
    }
}

/// Quits on `q` or Escape.
struct Quit {
    requested: std::cell::Cell<bool>,
}

impl InputListener for Quit {
    fn on_input(&self, event: &mut InputEvent) {
        if event.key().is_char('q') || event.key().code == KeyCode::Escape {
            self.requested.set(true);
            event.mark_handled();
        }
    }
}

fn main() -> weft::Result<()> {
    let console = CrosstermConsole::new(ConsoleOptions::fullscreen())?;
    let screen = Screen::new(Box::new(console));
    screen.set_content(Demo::new());

    let quit = Rc::new(Quit {
        requested: std::cell::Cell::new(false),
    });
    let listeners: Vec<Rc<dyn InputListener>> = vec![quit.clone()];

    while !quit.requested.get() {
        if !crossterm::event::poll(Duration::from_millis(50))? {
            continue;
        }
        match Event::from_crossterm(crossterm::event::read()?) {
            Some(Event::Key(key)) => {
                let mut event = InputEvent::new(key);
                weft::dispatch(&listeners, &mut event);
            }
            Some(Event::Mouse(mouse)) => {
                screen.set_mouse_position(Some(mouse.position));
                match mouse.kind {
                    MouseEventKind::Down(_) => screen.set_mouse_button(true),
                    MouseEventKind::Up(_) => screen.set_mouse_button(false),
                    _ => {}
                }
            }
            Some(Event::Resize(_)) => screen.adjust_buffer_to_window(),
            _ => {}
        }
    }

    Ok(())
}
