//! Terminal-based sandbox explorer using ratatui
//!
//! Top-down view of the terrain tile with the player, props and a journal
//! panel. WASD/arrows walk, space jumps, J writes a journal entry.

use std::io::stdout;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tracing::info;

use crate::coords::GridIndex;
use crate::error::Result;
use crate::journal::{nearby_features, JournalDesk, JournalRequest, TimeOfDay};
use crate::player::{MovementIntent, PlayerBody, TerrainGround};
use crate::world::{TickReport, WorldController, EMERGED_MESSAGE};

/// Frame budget for the main loop (~30 fps)
const FRAME: Duration = Duration::from_millis(33);
/// Terminals report presses, not releases; a press counts as held this long
const KEY_HOLD: Duration = Duration::from_millis(180);
/// Largest physics step, so a stalled frame does not tunnel the player
const MAX_STEP: f32 = 0.1;

/// Darkened background for a terrain color so glyphs stay readable
fn make_bg_color(r: u8, g: u8, b: u8) -> Color {
    let factor = 0.35;
    Color::Rgb((r as f32 * factor) as u8, (g as f32 * factor) as u8, (b as f32 * factor) as u8)
}

fn make_fg_color(r: u8, g: u8, b: u8) -> Color {
    let brighten = |c: u8| -> u8 { (c as u16 + 40).min(255) as u8 };
    Color::Rgb(brighten(r), brighten(g), brighten(b))
}

// =============================================================================
// INPUT
// =============================================================================

/// Recently pressed movement keys, turned into a movement intent
#[derive(Clone, Copy, Debug, Default)]
struct HeldKeys {
    forward: Option<Instant>,
    back: Option<Instant>,
    left: Option<Instant>,
    right: Option<Instant>,
    jump: Option<Instant>,
}

impl HeldKeys {
    fn intent(&self, now: Instant) -> MovementIntent {
        let held = |t: Option<Instant>| t.map(|t| now.duration_since(t) < KEY_HOLD).unwrap_or(false);
        let axis = |pos: bool, neg: bool| (pos as i8 - neg as i8) as f32;
        MovementIntent {
            forward: axis(held(self.forward), held(self.back)),
            strafe: axis(held(self.right), held(self.left)),
            jump: held(self.jump),
        }
    }
}

// =============================================================================
// EXPLORER STATE
// =============================================================================

/// Explorer state
pub struct Explorer {
    world: WorldController,
    body: PlayerBody,
    ground: TerrainGround,
    desk: JournalDesk,
    held: HeldKeys,
    time_of_day: TimeOfDay,
    feature_rng: ChaCha8Rng,
    show_help: bool,
    message: Option<String>,
}

impl Explorer {
    pub fn new(mut world: WorldController, desk: JournalDesk) -> Self {
        let ground = TerrainGround::new(world.snapshot().seeds.terrain);
        let mut body = PlayerBody::default();
        body.respawn(&ground);
        world.place_player(body.position);

        Explorer {
            world,
            body,
            ground,
            desk,
            held: HeldKeys::default(),
            time_of_day: TimeOfDay::default(),
            feature_rng: ChaCha8Rng::from_entropy(),
            show_help: false,
            message: None,
        }
    }

    pub fn world(&self) -> &WorldController {
        &self.world
    }

    pub fn body(&self) -> &PlayerBody {
        &self.body
    }

    pub fn desk(&self) -> &JournalDesk {
        &self.desk
    }

    /// Advance one frame with an explicit intent.
    pub fn tick(&mut self, intent: &MovementIntent, dt: f32) -> TickReport {
        self.body.step(intent, &self.ground, dt.min(MAX_STEP));
        let report = self.world.update(self.body.position);

        if report.was_reset() {
            self.ground = TerrainGround::new(self.world.snapshot().seeds.terrain);
            self.desk.note(EMERGED_MESSAGE);
            self.message = Some(format!("New land! Seed: {}", self.world.seed()));
        } else if let Some(biome) = report.biome_changed {
            self.message = Some(format!("Entered {}", biome));
        }

        if let Some(entry) = self.desk.poll() {
            info!(fallback = entry.fallback, "journal entry received");
        }
        report
    }

    /// Regenerate the world with a new random seed
    pub fn regenerate(&mut self) {
        let seed = self.world.regenerate();
        self.ground = TerrainGround::new(self.world.snapshot().seeds.terrain);
        self.body.respawn(&self.ground);
        self.world.place_player(self.body.position);
        self.message = Some(format!("New world generated! Seed: {}", seed));
    }

    /// Ask for a journal entry about the current surroundings
    pub fn request_journal(&mut self) -> bool {
        let request = JournalRequest {
            biome: self.world.current_biome(),
            time_of_day: self.time_of_day,
            nearby_features: nearby_features(self.body.position.y, &mut self.feature_rng),
        };
        let started = self.desk.request(request);
        if !started {
            self.message = Some("Still writing...".to_string());
        }
        started
    }

    fn cycle_time_of_day(&mut self) {
        self.time_of_day = self.time_of_day.next();
        self.message = Some(format!("Time: {}", self.time_of_day.name()));
    }

    /// Grid cell under the player, unbounded (may lie off the tile)
    fn player_cell(&self) -> (i64, i64) {
        let position = self.body.position;
        self.world.terrain().mapping.world_to_cell(position.x as f64, position.z as f64)
    }

    /// Render the map centered on the player, one vertex per cell
    fn render_map(&self, area: Rect, buf: &mut Buffer) {
        let terrain = self.world.terrain();
        let width = terrain.width() as i64;
        let (pi, pj) = self.player_cell();
        let start_i = pi - area.width as i64 / 2;
        let start_j = pj - area.height as i64 / 2;

        let screen = |i: i64, j: i64| -> Option<(u16, u16)> {
            let dx = i - start_i;
            let dy = j - start_j;
            if dx < 0 || dy < 0 || dx >= area.width as i64 || dy >= area.height as i64 {
                return None;
            }
            Some((area.x + dx as u16, area.y + dy as u16))
        };

        for dy in 0..area.height {
            for dx in 0..area.width {
                let i = start_i + dx as i64;
                let j = start_j + dy as i64;
                let (ch, style) = if (0..width).contains(&i) && (0..width).contains(&j) {
                    let index = GridIndex::new(i as usize, j as usize);
                    let biome = terrain.biome(index);
                    let (r, g, b) = terrain.colors().get(index.i, index.j).to_rgb();
                    (biome.glyph(), Style::default().fg(make_fg_color(r, g, b)).bg(make_bg_color(r, g, b)))
                } else {
                    (' ', Style::default().bg(Color::Black))
                };
                if let Some(cell) = buf.cell_mut((area.x + dx, area.y + dy)) {
                    cell.set_char(ch).set_style(style);
                }
            }
        }

        for prop in self.world.props().instances() {
            let Some(index) = terrain.mapping.world_to_grid(prop.position.x as f64, prop.position.z as f64) else {
                continue;
            };
            if let Some(pos) = screen(index.i as i64, index.j as i64) {
                if let Some(cell) = buf.cell_mut(pos) {
                    cell.set_char(prop.kind.glyph())
                        .set_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));
                }
            }
        }

        if let Some(pos) = screen(pi, pj) {
            if let Some(cell) = buf.cell_mut(pos) {
                cell.set_char('@').set_style(Style::default().fg(Color::Black).bg(Color::Yellow));
            }
        }
    }

    /// Render the side panel: location, then the journal page
    fn render_panel(&self, area: Rect, buf: &mut Buffer) {
        let pos = self.body.position;
        let location = match self.world.terrain().mapping.world_to_grid(pos.x as f64, pos.z as f64) {
            Some(index) => format!("cell {}", index),
            None => "beyond the map".to_string(),
        };

        let mut lines = vec![
            Line::from(Span::styled(
                self.world.current_biome().display_name().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Seed: {}", self.world.seed())),
            Line::from(format!("Pos: {:.1}, {:.1}, {:.1}", pos.x, pos.y, pos.z)),
            Line::from(location),
            Line::from(format!("Time: {}", self.time_of_day.name())),
            Line::from(""),
            Line::from(Span::styled("Journal", Style::default().fg(Color::Yellow))),
        ];
        if self.desk.is_loading() {
            lines.push(Line::from(Span::styled("Writing...", Style::default().fg(Color::DarkGray))));
        }
        lines.push(Line::from(self.desk.page_text().to_string()));

        Paragraph::new(lines)
            .block(Block::default().title(" Explorer ").borders(Borders::ALL))
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }

    /// Render help overlay
    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        let help_text = [
            "=== Terrain Sandbox ===",
            "",
            "  WASD / Arrows - Walk",
            "  Space - Jump",
            "  J - Write journal entry",
            "  T - Cycle time of day",
            "  R - Regenerate world (new seed)",
            "  ? - Toggle this help",
            "  Q / Esc - Quit",
            "",
            "Map: ~ ocean  . beach  \" grass  f forest",
            "     ^ mountain  * snow",
            "     M mine  T tree  a animal  @ you",
            "",
            "Walk into a mine to travel to a new land.",
        ];

        let width = 46.min(area.width);
        let height = (help_text.len() as u16 + 2).min(area.height);
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let help_area = Rect::new(x, y, width, height);

        Clear.render(help_area, buf);
        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::DarkGray));
        let inner = block.inner(help_area);
        block.render(help_area, buf);

        for (i, line) in help_text.iter().enumerate() {
            if i as u16 >= inner.height {
                break;
            }
            buf.set_string(inner.x, inner.y + i as u16, line, Style::default().fg(Color::White));
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.area());
        let content = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(34)])
            .split(chunks[0]);

        self.render_map(content[0], frame.buffer_mut());
        self.render_panel(content[1], frame.buffer_mut());

        let msg = self.message.as_ref().map(|m| format!(" | {}", m)).unwrap_or_default();
        let status = format!(
            " {} | {} props{} | J:Journal  R:Regen  ?:Help  Q:Quit",
            self.world.current_biome(),
            self.world.props().len(),
            msg,
        );
        Paragraph::new(status)
            .style(Style::default().bg(Color::DarkGray).fg(Color::White))
            .render(chunks[1], frame.buffer_mut());

        if self.show_help {
            self.render_help(content[0], frame.buffer_mut());
        }
    }

    /// Handle one key press. Returns false when the explorer should quit.
    fn handle_key(&mut self, code: KeyCode, now: Instant) -> bool {
        if self.show_help {
            self.show_help = false;
            return true;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Up | KeyCode::Char('w') => self.held.forward = Some(now),
            KeyCode::Down | KeyCode::Char('s') => self.held.back = Some(now),
            KeyCode::Left | KeyCode::Char('a') => self.held.left = Some(now),
            KeyCode::Right | KeyCode::Char('d') => self.held.right = Some(now),
            KeyCode::Char(' ') => self.held.jump = Some(now),
            KeyCode::Char('j') | KeyCode::Char('J') => {
                self.request_journal();
            }
            KeyCode::Char('t') | KeyCode::Char('T') => self.cycle_time_of_day(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.regenerate(),
            _ => {}
        }
        true
    }
}

/// Run the explorer until the player quits.
pub fn run_explorer(world: WorldController, desk: JournalDesk) -> Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut explorer = Explorer::new(world, desk);
    let result = event_loop(&mut terminal, &mut explorer);

    // Cleanup even when the loop failed
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, explorer: &mut Explorer) -> Result<()> {
    let mut last = Instant::now();

    loop {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        let intent = explorer.held.intent(now);
        explorer.tick(&intent, dt);
        terminal.draw(|f| explorer.draw(f))?;

        if event::poll(FRAME)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Release && !explorer.handle_key(key.code, Instant::now()) {
                    break;
                }
            }
        }
    }

    info!(seed = explorer.world.seed(), "explorer closed");
    Ok(())
}
