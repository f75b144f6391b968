use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
};
use std::collections::BTreeSet;
use std::io::stdout;
use tracing::warn;

use crate::classify::{annotate_all, job_types};
use crate::export::format_date;
use crate::favorites::Favorites;
use crate::feed::FeedSource;
use crate::filter::{FilterConfig, ViewStats};
use crate::models::{AnnotatedListing, Decision, ListingKey};
use crate::store::KvStore;
use crate::swipe::{SessionState, SwipeSession};

type Term = Terminal<CrosstermBackend<std::io::Stdout>>;

fn with_terminal<T>(body: impl FnOnce(&mut Term) -> Result<T>) -> Result<T> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = body(&mut terminal);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn score_color(score: u8) -> Color {
    if score >= 70 {
        Color::Green
    } else if score >= 40 {
        Color::Yellow
    } else {
        Color::DarkGray
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

// --- List browser ---

struct BrowseState<'a> {
    all: Vec<AnnotatedListing>,
    view: Vec<AnnotatedListing>,
    config: FilterConfig,
    favorites: Favorites<'a>,
    starred: BTreeSet<ListingKey>,
    selected: usize,
    scroll_offset: u16,
    message: Option<String>,
    error: Option<String>,
}

impl<'a> BrowseState<'a> {
    fn new(store: &'a dyn KvStore, all: Vec<AnnotatedListing>, config: FilterConfig) -> Self {
        let mut state = Self {
            all,
            view: Vec::new(),
            config,
            favorites: Favorites::new(store),
            starred: BTreeSet::new(),
            selected: 0,
            scroll_offset: 0,
            message: None,
            error: None,
        };
        state.apply();
        state
    }

    fn apply(&mut self) {
        self.starred = self.favorites.all();
        let now = chrono::Utc::now().timestamp();
        self.view = self.config.apply(&self.all, &self.starred, now);
        if self.selected >= self.view.len() {
            self.selected = self.view.len().saturating_sub(1);
        }
    }

    fn current_job(&self) -> Option<&AnnotatedListing> {
        self.view.get(self.selected)
    }

    fn next(&mut self) {
        if !self.view.is_empty() && self.selected < self.view.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn toggle_star(&mut self) {
        let Some(job) = self.current_job() else { return };
        let key = job.key();
        match self.favorites.toggle(&key) {
            Ok(true) => self.message = Some(format!("Starred {}", key)),
            Ok(false) => self.message = Some(format!("Unstarred {}", key)),
            Err(e) => {
                warn!("Failed to toggle favorite: {:#}", e);
                self.message = Some(format!("Error: {:#}", e));
            }
        }
        self.apply();
    }

    fn refresh(&mut self, feed: &dyn FeedSource) {
        match feed.fetch() {
            Ok(listings) => {
                self.all = annotate_all(listings);
                self.error = None;
                self.message = Some(format!("Last updated: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));
            }
            Err(e) => {
                warn!("Refresh failed: {:#}", e);
                self.all.clear();
                self.error = Some(format!("{:#}", e));
                self.message = Some("Error loading internships (r to retry)".to_string());
            }
        }
        self.selected = 0;
        self.scroll_offset = 0;
        self.apply();
    }
}

// Returns the URL of the listing open on exit with `o`.
pub fn run_browse(
    store: &dyn KvStore,
    feed: &dyn FeedSource,
    all: Vec<AnnotatedListing>,
    config: FilterConfig,
) -> Result<Option<String>> {
    let mut state = BrowseState::new(store, all, config);

    with_terminal(|terminal| browse_loop(terminal, &mut state, feed))
}

fn browse_loop(terminal: &mut Term, state: &mut BrowseState, feed: &dyn FeedSource) -> Result<Option<String>> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        terminal.draw(|frame| draw_browse(frame, state, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(None),
                KeyCode::Char('o') => {
                    return Ok(state.current_job().map(|j| j.listing.url.clone()));
                }
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => {
                    state.scroll_offset = state.scroll_offset.saturating_add(3)
                }
                KeyCode::Char('K') | KeyCode::PageUp => {
                    state.scroll_offset = state.scroll_offset.saturating_sub(3)
                }
                KeyCode::Char('s') => state.toggle_star(),
                KeyCode::Char('c') => {
                    state.config.clear();
                    state.apply();
                }
                KeyCode::Char('f') => {
                    state.config.favorites_only = !state.config.favorites_only;
                    state.apply();
                }
                KeyCode::Char('r') => {
                    state.message = Some("Loading internships...".to_string());
                    terminal.draw(|frame| draw_browse(frame, state, &mut list_state))?;
                    state.refresh(feed);
                }
                _ => {}
            }
            list_state.select(Some(state.selected));
        }
    }
}

fn draw_browse(frame: &mut Frame, state: &BrowseState, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[0]);

    let items: Vec<ListItem> = state
        .view
        .iter()
        .map(|job| {
            let star = if state.starred.contains(&job.key()) { "*" } else { " " };
            let line = Line::from(vec![
                Span::raw(format!("{} ", star)),
                Span::styled(
                    format!("{:>3}% ", job.match_score),
                    Style::default().fg(score_color(job.match_score)),
                ),
                Span::raw(format!(
                    "{} | {}",
                    truncate(&job.listing.title, 35),
                    job.listing.company_name
                )),
            ]);
            ListItem::new(line)
        })
        .collect();

    let stats = ViewStats::new(state.all.len(), &state.view);
    let top = stats
        .top_score
        .map(|s| format!("{}%", s))
        .unwrap_or_else(|| "N/A".to_string());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Jobs {}/{}  top {}  high {} ",
            stats.filtered, stats.total, top, stats.high_matches
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    let detail = match (&state.error, state.current_job()) {
        (Some(err), _) => Text::from(vec![
            Line::from(Span::styled(format!("Error: {}", err), Style::default().fg(Color::Red))),
            Line::from(""),
            Line::from("Press r to retry."),
        ]),
        (None, Some(job)) => build_detail(job, state.starred.contains(&job.key())),
        (None, None) => Text::from(vec![
            Line::from("No jobs match your current filters."),
            Line::from(Span::styled(
                "Press c to clear filters.",
                Style::default().fg(Color::DarkGray),
            )),
        ]),
    };
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));
    frame.render_widget(detail_widget, chunks[1]);

    let footer = match &state.message {
        Some(msg) => format!(" {}", msg),
        None => " j/k:navigate  J/K:scroll  s:star  f:favorites  c:clear  r:refresh  o:open  q:quit"
            .to_string(),
    };
    frame.render_widget(
        Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
        rows[1],
    );
}

fn build_detail(job: &AnnotatedListing, starred: bool) -> Text<'static> {
    let listing = &job.listing;
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        listing.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!("at {}", listing.company_name)));
    lines.push(Line::from(Span::styled(
        format!("{}% Match", job.match_score),
        Style::default().fg(score_color(job.match_score)),
    )));
    if starred {
        lines.push(Line::from(Span::styled("* Favorite", Style::default().fg(Color::Yellow))));
    }
    lines.push(Line::from(""));

    lines.push(Line::from(format!("Location: {}", listing.locations_display())));
    lines.push(Line::from(format!("Posted:   {}", format_date(listing.date_posted))));
    if let Some(sponsorship) = listing.sponsorship.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(Line::from(format!("Sponsor:  {}", sponsorship)));
    }
    if !listing.terms.is_empty() {
        lines.push(Line::from(format!("Terms:    {}", listing.terms.join(", "))));
    }
    let categories: Vec<&str> = job_types(listing).into_iter().map(|t| t.label()).collect();
    lines.push(Line::from(format!("Type:     {}", categories.join(", "))));
    lines.push(Line::from(""));
    lines.push(Line::from(format!("Apply: {}", listing.url)));

    Text::from(lines)
}

// --- Swipe view ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SwipeCommand {
    Pass,
    Like,
    Undo,
    Refresh,
    Reset,
    Quit,
}

fn swipe_command(code: KeyCode) -> Option<SwipeCommand> {
    match code {
        KeyCode::Left | KeyCode::Char('h') => Some(SwipeCommand::Pass),
        KeyCode::Right | KeyCode::Char('l') => Some(SwipeCommand::Like),
        KeyCode::Char('u') => Some(SwipeCommand::Undo),
        KeyCode::Char('r') => Some(SwipeCommand::Refresh),
        KeyCode::Char('R') => Some(SwipeCommand::Reset),
        KeyCode::Char('q') | KeyCode::Esc => Some(SwipeCommand::Quit),
        _ => None,
    }
}

// Runs the session-only commands; refresh, reset and quit need the terminal.
fn apply_command(session: &mut SwipeSession, command: SwipeCommand) -> Result<Option<String>> {
    let message = match command {
        SwipeCommand::Pass => session
            .decide(Decision::Pass)?
            .map(|a| format!("Passed on {}", a.job_key)),
        SwipeCommand::Like => session
            .decide(Decision::Like)?
            .map(|a| format!("Liked {}", a.job_key)),
        SwipeCommand::Undo => session
            .undo()?
            .map(|a| format!("Undid {} on {}", a.action, a.job_key)),
        SwipeCommand::Refresh | SwipeCommand::Reset | SwipeCommand::Quit => None,
    };
    Ok(message)
}

pub fn run_swipe(session: &mut SwipeSession, feed: &dyn FeedSource) -> Result<()> {
    with_terminal(|terminal| {
        terminal.draw(|frame| draw_swipe(frame, session, None, false))?;
        if let Err(e) = session.refresh(feed) {
            warn!("Initial fetch failed: {:#}", e);
        }
        swipe_loop(terminal, session, feed)
    })
}

fn swipe_loop(terminal: &mut Term, session: &mut SwipeSession, feed: &dyn FeedSource) -> Result<()> {
    let mut message: Option<String> = None;
    let mut confirm_reset = false;

    loop {
        terminal.draw(|frame| draw_swipe(frame, session, message.as_deref(), confirm_reset))?;

        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if confirm_reset {
            confirm_reset = false;
            if key.code == KeyCode::Char('y') {
                session.begin_loading();
                terminal.draw(|frame| draw_swipe(frame, session, None, false))?;
                message = match session.reset(feed) {
                    Ok(()) => Some("Swipes reset".to_string()),
                    Err(e) => Some(format!("Error: {:#}", e)),
                };
            } else {
                message = None;
            }
            continue;
        }

        let outcome = match swipe_command(key.code) {
            None => Ok(None),
            Some(SwipeCommand::Quit) => break,
            Some(SwipeCommand::Refresh) => {
                session.begin_loading();
                terminal.draw(|frame| draw_swipe(frame, session, None, false))?;
                session.refresh(feed).map(|()| None)
            }
            Some(SwipeCommand::Reset) => {
                confirm_reset = true;
                Ok(None)
            }
            Some(command) => apply_command(session, command),
        };

        message = match outcome {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Swipe action failed: {:#}", e);
                Some(format!("Error: {:#}", e))
            }
        };
    }
    Ok(())
}

fn draw_swipe(frame: &mut Frame, session: &SwipeSession, message: Option<&str>, confirm_reset: bool) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let stats = session.stats();
    let ratio = if stats.total > 0 {
        stats.position as f64 / stats.total as f64
    } else {
        0.0
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Job Swipe "))
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{} / {}", stats.position, stats.total));
    frame.render_widget(gauge, rows[0]);

    let counters = Line::from(vec![
        Span::styled(format!(" Liked {} ", stats.liked), Style::default().fg(Color::Green)),
        Span::styled(format!(" Passed {} ", stats.passed), Style::default().fg(Color::Red)),
        Span::styled(
            format!(" Remaining {} ", stats.remaining),
            Style::default().fg(Color::Cyan),
        ),
    ]);
    frame.render_widget(Paragraph::new(counters), rows[1]);

    let body = match session.state() {
        SessionState::Loading => Text::from("Loading internships..."),
        SessionState::Failed(err) => Text::from(vec![
            Line::from(Span::styled(format!("Error: {}", err), Style::default().fg(Color::Red))),
            Line::from(""),
            Line::from("Press r to retry."),
        ]),
        SessionState::Exhausted => Text::from(vec![
            Line::from(Span::styled(
                "All done!",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("You've reviewed all available jobs. Your liked jobs are in your favorites."),
            Line::from("Press u to undo, r to refresh or R to start over."),
        ]),
        SessionState::Reviewing => match session.current() {
            Some(job) => build_card(job, rows[2].width.saturating_sub(4) as usize),
            None => Text::from(""),
        },
    };
    frame.render_widget(
        Paragraph::new(body)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: false }),
        rows[2],
    );

    let footer = if confirm_reset {
        " Reset all swipes? This clears your liked and passed jobs. (y/n)".to_string()
    } else if let Some(msg) = message {
        format!(" {}", msg)
    } else {
        " <-:pass  ->:like  u:undo  r:refresh  R:reset  q:quit".to_string()
    };
    frame.render_widget(
        Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
        rows[3],
    );
}

fn build_card(job: &AnnotatedListing, width: usize) -> Text<'static> {
    let listing = &job.listing;
    let width = width.max(20);
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        format!(" {}% Match ", job.match_score),
        Style::default()
            .bg(score_color(job.match_score))
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));
    for line in textwrap::wrap(&listing.title, width) {
        lines.push(Line::from(Span::styled(
            line.into_owned(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(listing.company_name.clone()));
    lines.push(Line::from(""));

    for line in textwrap::wrap(&format!("Location: {}", listing.locations_display()), width) {
        lines.push(Line::from(line.into_owned()));
    }
    lines.push(Line::from(format!("Posted:   {}", format_date(listing.date_posted))));
    if let Some(sponsorship) = listing.sponsorship.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(Line::from(Span::styled(
            format!("Sponsor:  {}", sponsorship),
            Style::default().fg(Color::Cyan),
        )));
    }
    if !listing.terms.is_empty() {
        lines.push(Line::from(format!("Terms:    {}", listing.terms.join(", "))));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        listing.url.clone(),
        Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
    )));

    Text::from(lines)
}
