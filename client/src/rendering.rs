use client::game::{ClientBoxman, ClientGameState};
use macroquad::prelude::*;
use shared::{WORLD_HEIGHT, WORLD_WIDTH};

const BOX_SIZE: f32 = 20.0;
const HEADING_LENGTH: f32 = 16.0;

pub struct Renderer {
    width: f32,
    height: f32,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
        }
    }

    pub fn render(&self, game_state: &ClientGameState, server: &str) {
        clear_background(Color::from_rgba(26, 26, 26, 255));

        for boxman in game_state.entities() {
            self.draw_boxman(boxman);
        }

        self.draw_ui(game_state, server);
    }

    fn draw_boxman(&self, boxman: &ClientBoxman) {
        let position = boxman.position();
        let color = Color::from_rgba(boxman.color.r, boxman.color.g, boxman.color.b, 255);
        // Forward thrust points along -direction in screen space
        let heading = -boxman.direction();

        draw_rectangle_ex(
            position.x,
            position.y,
            BOX_SIZE,
            BOX_SIZE,
            DrawRectangleParams {
                offset: vec2(0.5, 0.5),
                rotation: heading,
                color,
            },
        );

        let end_x = position.x + heading.cos() * HEADING_LENGTH;
        let end_y = position.y + heading.sin() * HEADING_LENGTH;
        draw_line(position.x, position.y, end_x, end_y, 2.0, WHITE);

        if boxman.is_own() {
            draw_circle_lines(position.x, position.y, BOX_SIZE, 1.0, WHITE);
        }
    }

    fn draw_ui(&self, game_state: &ClientGameState, server: &str) {
        let connection_color = if game_state.own_id().is_some() {
            GREEN
        } else {
            RED
        };
        draw_rectangle(10.0, 10.0, 8.0, 8.0, connection_color);
        draw_text(server, 24.0, 18.0, 14.0, WHITE);

        let player_text = format!("{} players", game_state.len());
        draw_text(&player_text, 10.0, 34.0, 14.0, WHITE);

        draw_text(
            "Arrows to move, Esc to quit",
            10.0,
            self.height - 10.0,
            14.0,
            Color::from_rgba(136, 136, 136, 255),
        );
        draw_rectangle_lines(0.0, 0.0, self.width, self.height, 1.0, DARKGRAY);
    }
}
