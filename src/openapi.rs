use utoipa::OpenApi;

use crate::identity_client::Identity;
use crate::routes::admin_user::handlers::{__path_grant_admin, __path_list_admins};
use crate::routes::admin_user::schemas::GrantAdminRequest;
use crate::routes::auth::guard::GuardDecision;
use crate::routes::auth::handlers::{
    __path_confirm_code, __path_create_session, __path_fetch_session, __path_guard_decision,
    __path_issue_challenge, __path_mount_login_form, __path_reset_login_form, __path_send_code,
    __path_sign_out, __path_unmount_login_form,
};
use crate::routes::auth::schemas::{
    ChallengeWidgetData, ConfirmCodeRequest, LoginFormData, LoginStep, MountLoginFormData,
    MountLoginFormRequest, SendCodeRequest, SessionData, SessionTokenData, SignInData,
    UserProfile,
};
use crate::routes::bird::handlers::{
    __path_bird_detail, __path_create_bird, __path_edit_bird, __path_featured_birds,
    __path_list_birds, __path_remove_bird,
};
use crate::routes::bird::schemas::{Bird, BirdAvailability, BirdParents, BirdRequest, ParentMedia};
use crate::routes::media::handlers::{__path_delete_media, __path_upload_media, __path_upload_progress};
use crate::routes::media::schemas::{
    DeleteMediaRequest, MediaKind, UploadState, UploadStatus, UploadedMedia,
};
use crate::routes::util::handlers::{__path_contact_link, __path_health_check};
use crate::routes::util::schemas::ContactLink;
use crate::schemas::{EmptyGenericResponse, RedirectData};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        contact_link,
        list_birds,
        featured_birds,
        bird_detail,
        create_session,
        fetch_session,
        sign_out,
        guard_decision,
        mount_login_form,
        unmount_login_form,
        issue_challenge,
        send_code,
        confirm_code,
        reset_login_form,
        create_bird,
        edit_bird,
        remove_bird,
        upload_media,
        upload_progress,
        delete_media,
        list_admins,
        grant_admin,
    ),
    components(schemas(
        EmptyGenericResponse,
        RedirectData,
        Identity,
        UserProfile,
        GuardDecision,
        SessionTokenData,
        SessionData,
        ChallengeWidgetData,
        LoginStep,
        LoginFormData,
        MountLoginFormRequest,
        MountLoginFormData,
        SendCodeRequest,
        ConfirmCodeRequest,
        SignInData,
        Bird,
        BirdAvailability,
        BirdParents,
        ParentMedia,
        BirdRequest,
        MediaKind,
        UploadState,
        UploadStatus,
        UploadedMedia,
        DeleteMediaRequest,
        GrantAdminRequest,
        ContactLink,
    )),
    tags(
        (name = "Gamefowl Farm REST API", description = "Bird catalog and admin console endpoints")
    ),
)]
pub struct ApiDoc {}
