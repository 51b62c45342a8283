//! Turns a chosen suggestion into the events the rest of the app acts on.

use crate::config::SearchConfig;
use crate::event::CameraMove;
use crate::event::SearchEvent;
use crate::suggestion::Coordinates;
use crate::suggestion::Suggestion;

pub fn route(suggestion: &Suggestion, config: &SearchConfig) -> Vec<SearchEvent> {
    match suggestion {
        Suggestion::Address(address) => vec![
            fly_to(address.coordinates, config),
            SearchEvent::LocationSelected {
                coordinates: address.coordinates,
                label: address.label.clone(),
                metadata: address.raw_metadata.clone(),
            },
        ],
        Suggestion::Entity(entity) => vec![
            fly_to(entity.coordinates, config),
            SearchEvent::EntityFocused {
                id: entity.id.clone(),
                name: entity.name.clone(),
                category: entity.category.clone(),
                coordinates: entity.coordinates,
            },
        ],
        Suggestion::Directory(entry) => vec![SearchEvent::Navigate {
            path: format!("{}{}", config.profile_route_prefix, entry.handle),
        }],
        Suggestion::Person(_) | Suggestion::Content(_) => vec![SearchEvent::DetailPanelRequested {
            kind: suggestion.kind(),
            payload: suggestion.clone(),
        }],
    }
}

fn fly_to(center: Coordinates, config: &SearchConfig) -> SearchEvent {
    SearchEvent::FlyTo(CameraMove {
        center,
        zoom: config.fly_to_zoom,
        duration: config.fly_to_duration(),
    })
}
