use super::util::title_style;
use crate::{
    app::{Action, AppContext, AppResult, AppView, FocusedPane},
    components::Component,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

#[derive(Debug, Default)]
pub struct QuizPane {
    highlighted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizCommand {
    MoveUp,
    MoveDown,
    Choose(usize),
    ChooseHighlighted,
    Restart,
}

impl QuizPane {
    fn choose(&mut self, option: usize, ctx: &mut AppContext<'_>) -> Option<Action> {
        let before = &ctx.state.quiz;
        if before.is_completed() {
            return None;
        }
        let next = before.select(option);
        if next == *before {
            return None;
        }
        self.highlighted = 0;
        ctx.state.quiz = next;
        let quiz = &ctx.state.quiz;
        quiz.is_completed().then(|| {
            Action::ShowNotice(format!("Quiz finished: {}/{}", quiz.score(), quiz.total()))
        })
    }
}

impl Component for QuizPane {
    type Command = QuizCommand;

    fn command_for_key(&self, key: KeyEvent, view: &AppView<'_>) -> Option<Self::Command> {
        if view.state.quiz.is_completed() {
            return match key.code {
                KeyCode::Char('r') | KeyCode::Enter => Some(QuizCommand::Restart),
                _ => None,
            };
        }
        match (key.modifiers, key.code) {
            (_, KeyCode::Up) | (KeyModifiers::NONE, KeyCode::Char('k')) => Some(QuizCommand::MoveUp),
            (_, KeyCode::Down) | (KeyModifiers::NONE, KeyCode::Char('j')) => {
                Some(QuizCommand::MoveDown)
            }
            (_, KeyCode::Enter) => Some(QuizCommand::ChooseHighlighted),
            (KeyModifiers::NONE, KeyCode::Char('r')) => Some(QuizCommand::Restart),
            (KeyModifiers::NONE, KeyCode::Char(c @ 'a'..='d')) => {
                Some(QuizCommand::Choose(c as usize - 'a' as usize))
            }
            _ => None,
        }
    }

    fn update(
        &mut self,
        command: &Self::Command,
        ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        let options = ctx
            .state
            .quiz
            .current()
            .map(|(_, question)| question.options.len())
            .unwrap_or(0);
        let action = match command {
            QuizCommand::MoveUp => {
                self.highlighted = self.highlighted.saturating_sub(1);
                None
            }
            QuizCommand::MoveDown => {
                if self.highlighted + 1 < options {
                    self.highlighted += 1;
                }
                None
            }
            QuizCommand::Choose(option) => self.choose(*option, ctx),
            QuizCommand::ChooseHighlighted => self.choose(self.highlighted, ctx),
            QuizCommand::Restart => {
                self.highlighted = 0;
                ctx.state.quiz = ctx.state.quiz.restart();
                None
            }
        };
        Ok(action)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, view: &AppView<'_>) {
        let is_focused = matches!(view.state.navigation.focused_pane, FocusedPane::Quiz);
        let quiz = &view.state.quiz;

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from("Quiz").style(title_style(is_focused)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some((index, question)) = quiz.current() else {
            let summary = vec![
                Line::from(Span::styled(
                    "Quiz complete",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("Score: {} / {}", quiz.score(), quiz.total())),
                Line::from(Span::styled(
                    "Press r to try again",
                    Style::default().fg(Color::Gray),
                )),
            ];
            frame.render_widget(
                Paragraph::new(summary).alignment(Alignment::Center),
                inner,
            );
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(1),
            ])
            .split(inner);

        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("Question {} of {}", index + 1, quiz.total()),
                Style::default().fg(Color::Gray),
            )),
            chunks[0],
        );
        frame.render_widget(
            Paragraph::new(question.prompt.clone())
                .style(Style::default().add_modifier(Modifier::BOLD))
                .wrap(Wrap { trim: true }),
            chunks[1],
        );

        let items: Vec<ListItem> = question
            .options
            .iter()
            .enumerate()
            .map(|(i, option)| {
                let label = char::from(b'a' + (i as u8 % 26));
                ListItem::new(format!("{label}) {option}"))
            })
            .collect();
        let highlight = if is_focused {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let list = List::new(items)
            .highlight_style(highlight)
            .highlight_symbol("› ");
        let mut state = ListState::default().with_selected(Some(self.highlighted));
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }
}
