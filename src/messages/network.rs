//! Network messages - communication between App and Network layers

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::{
    Appointment, AppointmentRequest, AvailabilitySlot, ProfileUpdate, Provider, SignUpRequest,
    UserProfile,
};

/// Commands sent from App layer to Network layer
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Run one API call in the background
    Execute { id: u64, request: ApiRequest },
    /// Shutdown the network actor
    Shutdown,
}

/// API calls the Network layer knows how to run
#[derive(Debug, Clone)]
pub enum ApiRequest {
    SignUp(SignUpRequest),
    ListProviders {
        token: String,
    },
    DayAvailability {
        token: String,
        provider_id: String,
        date: NaiveDate,
    },
    CreateAppointment {
        token: String,
        request: AppointmentRequest,
    },
    UpdateProfile {
        token: String,
        update: ProfileUpdate,
    },
    /// Read the image at `path` and upload it
    UpdateAvatar {
        token: String,
        user_id: String,
        path: PathBuf,
    },
}

impl ApiRequest {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ApiRequest::SignUp(_) => "sign_up",
            ApiRequest::ListProviders { .. } => "list_providers",
            ApiRequest::DayAvailability { .. } => "day_availability",
            ApiRequest::CreateAppointment { .. } => "create_appointment",
            ApiRequest::UpdateProfile { .. } => "update_profile",
            ApiRequest::UpdateAvatar { .. } => "update_avatar",
        }
    }
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    SignedUp {
        id: u64,
        user: UserProfile,
    },
    Providers {
        id: u64,
        providers: Vec<Provider>,
    },
    DayAvailability {
        id: u64,
        provider_id: String,
        date: NaiveDate,
        slots: Vec<AvailabilitySlot>,
    },
    AppointmentCreated {
        id: u64,
        appointment: Appointment,
    },
    ProfileUpdated {
        id: u64,
        user: UserProfile,
    },
    AvatarUpdated {
        id: u64,
        user: UserProfile,
    },
    /// Any failed call
    Failed {
        id: u64,
        error: AppError,
    },
}

impl NetworkResponse {
    /// Get the request ID from the response
    pub fn id(&self) -> u64 {
        match self {
            NetworkResponse::SignedUp { id, .. } => *id,
            NetworkResponse::Providers { id, .. } => *id,
            NetworkResponse::DayAvailability { id, .. } => *id,
            NetworkResponse::AppointmentCreated { id, .. } => *id,
            NetworkResponse::ProfileUpdated { id, .. } => *id,
            NetworkResponse::AvatarUpdated { id, .. } => *id,
            NetworkResponse::Failed { id, .. } => *id,
        }
    }
}
