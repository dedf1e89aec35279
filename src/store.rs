// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory document store.
//!
//! The backing store is an external concern reached through this opaque
//! interface; entry points never compose queries themselves. The in-memory
//! tables here are the development/test implementation of that interface.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::models::{
    EventRecord, Facility, FacilityMatch, Profile, QuestionnaireResponse, Recommendation,
    SubjectId,
};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinate pairs, in meters.
fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

#[derive(Default)]
pub struct DataStore {
    facilities: Vec<Facility>,
    profiles: HashMap<SubjectId, Profile>,
    questionnaires: Vec<QuestionnaireResponse>,
    recommendations: Vec<Recommendation>,
    events: Vec<EventRecord>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_facilities(&mut self, facilities: Vec<Facility>) {
        self.facilities = facilities;
    }

    pub fn insert_facility(&mut self, facility: Facility) {
        self.facilities.push(facility);
    }

    /// Facilities within `radius_m` of the query point, closest first.
    ///
    /// With an activity filter, a facility matches when it offers at least
    /// one of the requested activities.
    pub fn search_facilities(
        &self,
        lat: f64,
        lng: f64,
        activities: &[String],
        radius_m: f64,
    ) -> Vec<FacilityMatch> {
        let mut matches: Vec<FacilityMatch> = self
            .facilities
            .iter()
            .filter(|facility| {
                activities.is_empty()
                    || facility
                        .activities
                        .iter()
                        .any(|offered| activities.contains(offered))
            })
            .filter_map(|facility| {
                let distance_m = haversine_m(lat, lng, facility.lat, facility.lng);
                (distance_m <= radius_m).then(|| FacilityMatch {
                    id: facility.id,
                    name: facility.name.clone(),
                    lat: facility.lat,
                    lng: facility.lng,
                    activities: facility.activities.clone(),
                    distance_m,
                })
            })
            .collect();

        matches.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        matches
    }

    pub fn get_profile(&self, user_id: &SubjectId) -> Option<Profile> {
        self.profiles.get(user_id).cloned()
    }

    pub fn put_profile(&mut self, user_id: SubjectId, profile: Profile) {
        self.profiles.insert(user_id, profile);
    }

    pub fn insert_questionnaire(
        &mut self,
        user_id: SubjectId,
        version: u32,
        responses: Value,
    ) -> QuestionnaireResponse {
        let response = QuestionnaireResponse {
            id: Uuid::new_v4(),
            user_id,
            version,
            responses,
            completed: true,
            created_at: Utc::now(),
        };
        self.questionnaires.push(response.clone());
        response
    }

    pub fn questionnaires(&self) -> &[QuestionnaireResponse] {
        &self.questionnaires
    }

    pub fn insert_recommendation(
        &mut self,
        user_id: SubjectId,
        activity_types: Vec<String>,
        reasoning: String,
        ai_input: Option<Value>,
    ) -> Recommendation {
        let recommendation = Recommendation {
            id: Uuid::new_v4(),
            user_id,
            activity_types,
            reasoning,
            ai_input,
            created_at: Utc::now(),
        };
        self.recommendations.push(recommendation.clone());
        recommendation
    }

    /// All recommendations for an identity, newest first.
    ///
    /// Reverse insertion order breaks created_at ties, so the latest insert
    /// wins even within one clock tick.
    pub fn list_recommendations(&self, user_id: &SubjectId) -> Vec<Recommendation> {
        let mut list: Vec<Recommendation> = self
            .recommendations
            .iter()
            .rev()
            .filter(|rec| &rec.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    pub fn latest_recommendation(&self, user_id: &SubjectId) -> Option<Recommendation> {
        self.list_recommendations(user_id).into_iter().next()
    }

    /// Shift a recommendation's timestamp into the past, for freshness tests.
    #[cfg(test)]
    pub fn backdate_recommendation(&mut self, id: &Uuid, by: chrono::Duration) {
        if let Some(rec) = self.recommendations.iter_mut().find(|rec| &rec.id == id) {
            rec.created_at -= by;
        }
    }

    pub fn record_event(&mut self, event: EventRecord) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }
}
