//! Static reference guides.

use axum::Json;

use crate::model::guide::{CHEMICAL_GUIDE, USER_GUIDE};
use crate::screen::Screen;

pub async fn chemicals() -> Json<Screen> {
    Json(Screen::Chemicals {
        groups: CHEMICAL_GUIDE,
    })
}

pub async fn guide() -> Json<Screen> {
    Json(Screen::Guide {
        sections: USER_GUIDE,
    })
}
