pub mod analysis_dto;
pub mod application_dto;
pub mod auth_dto;
pub mod interview_dto;
pub mod message_dto;
pub mod review_dto;
pub mod vacancy_dto;
